use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::expr::{Expr, Ref, Type};

/// Symbolic memory. References returned by `allocate` carry a pointer from
/// a strictly increasing counter and a type tag that is re-checked on every
/// access. Objects and arrays share the aggregate pool; the scalar pool is
/// allocatable but nothing in the executor writes it yet.
#[derive(Clone, Default)]
pub struct SymbolicHeap {
    counter: u64,
    pool: HashMap<Type, HashMap<u64, Expr>>,
    aggregate_pool: HashMap<u64, HashMap<i64, Expr>>,
}

impl SymbolicHeap {
    pub fn new() -> Self {
        SymbolicHeap::default()
    }

    pub fn allocate(&mut self, ty: Type) -> Ref {
        self.counter += 1;
        match ty {
            Type::Array | Type::Object => {
                self.aggregate_pool.insert(self.counter, HashMap::new());
            }
            _ => {
                self.pool.entry(ty).or_default();
            }
        }
        Ref { ty, ptr: self.counter }
    }

    pub fn assign_field(&mut self, r: Ref, field_idx: i64, value: Expr) -> Result<()> {
        self.aggregate_mut(r, Type::Object)?.insert(field_idx, value);
        Ok(())
    }

    pub fn get_field_value(&self, r: Ref, field_idx: i64) -> Result<Expr> {
        self.aggregate(r, Type::Object)?
            .get(&field_idx)
            .cloned()
            .ok_or(Error::Undefined { kind: "object field", index: field_idx, reference: r })
    }

    pub fn assign_to_array(&mut self, r: Ref, index: i64, value: Expr) -> Result<()> {
        self.aggregate_mut(r, Type::Array)?.insert(index, value);
        Ok(())
    }

    pub fn get_from_array(&self, r: Ref, index: i64) -> Result<Expr> {
        self.aggregate(r, Type::Array)?
            .get(&index)
            .cloned()
            .ok_or(Error::Undefined { kind: "array index", index, reference: r })
    }

    /// What the heap currently binds at a scalar address. Used by the
    /// solver bridge to see through `Reference` expressions.
    pub fn deref(&self, r: Ref) -> Result<Expr> {
        self.pool
            .get(&r.ty)
            .and_then(|cells| cells.get(&r.ptr))
            .cloned()
            .ok_or(Error::DanglingReference(r))
    }

    fn aggregate(&self, r: Ref, expected: Type) -> Result<&HashMap<i64, Expr>> {
        self.check_tag(r, expected)?;
        self.aggregate_pool.get(&r.ptr).ok_or(Error::DanglingReference(r))
    }

    fn aggregate_mut(&mut self, r: Ref, expected: Type) -> Result<&mut HashMap<i64, Expr>> {
        self.check_tag(r, expected)?;
        self.aggregate_pool.get_mut(&r.ptr).ok_or(Error::DanglingReference(r))
    }

    fn check_tag(&self, r: Ref, expected: Type) -> Result<()> {
        if r.ty != expected {
            return Err(Error::TypeMismatch(format!(
                "{expected:?} operation on {:?} reference {r:?}",
                r.ty
            )));
        }
        Ok(())
    }
}
