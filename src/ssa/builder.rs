use std::collections::{HashMap, HashSet};

use log::trace;

use super::ast::*;
use super::lexer::Pos;
use crate::error::{Error, Result};
use crate::program::function::*;
use crate::program::program::Program;
use crate::symbol::nstring::NString;

/// Lower a parsed module into SSA form.
///
/// The language is structured, so φ-placement needs no dominance analysis:
/// `if` arms meet in a join block that gets a φ for every name the arms
/// bound to different values, and loop headers get a φ for every name the
/// body assigns, patched once all back edges are known.
pub fn build_program(module: &Module) -> Result<Program> {
    let mut functions = Vec::new();
    for decl in &module.functions {
        functions.push(FunctionBuilder::new(decl).build()?);
    }
    Ok(Program::new(functions))
}

type VarMap = HashMap<NString, Value>;

struct LoopFrame {
    /// Where `continue` jumps: the header for `while`, the post block for `for`
    continue_to: BlockIdx,
    continue_edges: Vec<(BlockIdx, VarMap)>,
    break_edges: Vec<(BlockIdx, VarMap)>,
}

struct FunctionBuilder<'m> {
    decl: &'m FunctionDecl,
    blocks: Vec<Block>,
    next_value: ValueId,
    loops: Vec<LoopFrame>,
}

impl<'m> FunctionBuilder<'m> {
    fn new(decl: &'m FunctionDecl) -> Self {
        FunctionBuilder { decl, blocks: Vec::new(), next_value: 0, loops: Vec::new() }
    }

    fn build(mut self) -> Result<Function> {
        let decl = self.decl;
        let mut params = Vec::new();
        let mut vars = VarMap::new();
        for (name, ty) in &decl.params {
            let id = self.fresh_id();
            params.push(Param { id, name: *name, ty: *ty });
            vars.insert(*name, Value::Id(id));
        }
        let entry = self.new_block();
        if let Some(open) = self.stmts(&decl.body, entry, &mut vars)? {
            // fell off the end: return no values
            self.add_instr(open, InstrKind::Return { values: Vec::new() });
        }
        let function = Function::new(decl.name, params, self.blocks);
        trace!("lowered\n{function:?}");
        Ok(function)
    }

    fn fresh_id(&mut self) -> ValueId {
        let id = self.next_value;
        self.next_value += 1;
        id
    }

    fn new_block(&mut self) -> BlockIdx {
        self.blocks.push(Block::default());
        self.blocks.len() - 1
    }

    fn add_instr(&mut self, block: BlockIdx, kind: InstrKind) -> ValueId {
        let id = self.fresh_id();
        self.blocks[block].instrs.push(Instr { id, kind });
        id
    }

    fn jump(&mut self, from: BlockIdx, to: BlockIdx) {
        self.blocks[to].preds.push(from);
        self.add_instr(from, InstrKind::Jump { target: to });
    }

    fn branch(&mut self, from: BlockIdx, cond: Value, then_blk: BlockIdx, else_blk: BlockIdx) {
        self.blocks[then_blk].preds.push(from);
        self.blocks[else_blk].preds.push(from);
        self.add_instr(from, InstrKind::If { cond, then_blk, else_blk });
    }

    /// Merge the variable maps of all edges entering `join`. Names bound to
    /// the same value on every edge pass through; the rest get a φ. Only
    /// names defined on every edge survive the merge.
    fn merge(&mut self, join: BlockIdx, incoming: Vec<(BlockIdx, VarMap)>) -> VarMap {
        assert!(!incoming.is_empty());
        let mut names: Vec<NString> = incoming[0]
            .1
            .keys()
            .filter(|name| incoming.iter().all(|(_, m)| m.contains_key(name)))
            .copied()
            .collect();
        names.sort();

        let mut merged = VarMap::new();
        for name in names {
            let first = incoming[0].1[&name];
            if incoming.iter().all(|(_, m)| m[&name] == first) {
                merged.insert(name, first);
                continue;
            }
            let edges = incoming.iter().map(|(b, m)| (*b, m[&name])).collect();
            let phi = self.add_instr(join, InstrKind::Phi { edges });
            merged.insert(name, Value::Id(phi));
        }
        merged
    }

    fn stmts(
        &mut self,
        body: &[Stmt],
        mut cur: BlockIdx,
        vars: &mut VarMap,
    ) -> Result<Option<BlockIdx>> {
        for stmt in body {
            match self.stmt(stmt, cur, vars)? {
                Some(next) => cur = next,
                // terminated; anything after it is unreachable
                None => return Ok(None),
            }
        }
        Ok(Some(cur))
    }

    fn stmt(
        &mut self,
        stmt: &Stmt,
        cur: BlockIdx,
        vars: &mut VarMap,
    ) -> Result<Option<BlockIdx>> {
        match stmt {
            Stmt::Assign { name, value } => {
                let value = self.expr(value, cur, vars)?;
                vars.insert(*name, value);
                Ok(Some(cur))
            }
            Stmt::Block(inner) => self.stmts(inner, cur, vars),
            Stmt::Return { values } => {
                let mut resolved = Vec::new();
                for value in values {
                    resolved.push(self.expr(value, cur, vars)?);
                }
                self.add_instr(cur, InstrKind::Return { values: resolved });
                Ok(None)
            }
            Stmt::Break(pos) => {
                let snapshot = vars.clone();
                let frame = self.innermost_loop(*pos, "break")?;
                frame.break_edges.push((cur, snapshot));
                Ok(None)
            }
            Stmt::Continue(pos) => {
                let snapshot = vars.clone();
                let frame = self.innermost_loop(*pos, "continue")?;
                let target = frame.continue_to;
                frame.continue_edges.push((cur, snapshot));
                self.blocks[target].preds.push(cur);
                self.add_instr(cur, InstrKind::Jump { target });
                Ok(None)
            }
            Stmt::If { cond, then_body, else_body } => {
                self.if_stmt(cond, then_body, else_body.as_deref(), cur, vars)
            }
            Stmt::While { cond, body } => {
                self.loop_stmt(&None, Some(cond), &None, body, cur, vars)
            }
            Stmt::For { init, cond, post, body } => {
                self.loop_stmt(init, cond.as_ref(), post, body, cur, vars)
            }
        }
    }

    fn if_stmt(
        &mut self,
        cond: &ExprAst,
        then_body: &[Stmt],
        else_body: Option<&[Stmt]>,
        cur: BlockIdx,
        vars: &mut VarMap,
    ) -> Result<Option<BlockIdx>> {
        let cond = self.expr(cond, cur, vars)?;
        let then_blk = self.new_block();

        if let Some(else_body) = else_body {
            let else_blk = self.new_block();
            self.branch(cur, cond, then_blk, else_blk);

            let mut then_vars = vars.clone();
            let then_end = self.stmts(then_body, then_blk, &mut then_vars)?;
            let mut else_vars = vars.clone();
            let else_end = self.stmts(else_body, else_blk, &mut else_vars)?;

            let mut incoming = Vec::new();
            if let Some(b) = then_end {
                incoming.push((b, then_vars));
            }
            if let Some(b) = else_end {
                incoming.push((b, else_vars));
            }
            if incoming.is_empty() {
                return Ok(None);
            }
            let join = self.new_block();
            for (b, _) in &incoming {
                self.blocks[join].preds.push(*b);
                self.add_instr(*b, InstrKind::Jump { target: join });
            }
            *vars = self.merge(join, incoming);
            Ok(Some(join))
        } else {
            let join = self.new_block();
            self.branch(cur, cond, then_blk, join);

            let mut then_vars = vars.clone();
            let then_end = self.stmts(then_body, then_blk, &mut then_vars)?;

            let mut incoming = vec![(cur, vars.clone())];
            if let Some(b) = then_end {
                self.blocks[join].preds.push(b);
                self.add_instr(b, InstrKind::Jump { target: join });
                incoming.push((b, then_vars));
            }
            *vars = self.merge(join, incoming);
            Ok(Some(join))
        }
    }

    /// Shared lowering for `while` (no init/post) and `for`.
    fn loop_stmt(
        &mut self,
        init: &Option<(NString, ExprAst)>,
        cond: Option<&ExprAst>,
        post: &Option<(NString, ExprAst)>,
        body: &[Stmt],
        mut cur: BlockIdx,
        vars: &mut VarMap,
    ) -> Result<Option<BlockIdx>> {
        if let Some((name, value)) = init {
            let value = self.expr(value, cur, vars)?;
            vars.insert(*name, value);
        }

        let header = self.new_block();
        self.jump(cur, header);

        // every name the loop may rebind gets a header φ up front; the
        // back-edge operands are patched once they exist
        let mut rebound = HashSet::new();
        assigned_names(body, &mut rebound);
        if let Some((name, _)) = post {
            rebound.insert(*name);
        }
        let mut pending: Vec<(NString, ValueId, Value)> = Vec::new();
        let mut names: Vec<NString> =
            rebound.into_iter().filter(|name| vars.contains_key(name)).collect();
        names.sort();
        for name in names {
            let entry_value = vars[&name];
            let phi = self.add_instr(header, InstrKind::Phi { edges: Vec::new() });
            pending.push((name, phi, entry_value));
            vars.insert(name, Value::Id(phi));
        }

        let body_blk = self.new_block();
        let exit = self.new_block();
        let continue_to = if post.is_some() { self.new_block() } else { header };

        match cond {
            Some(cond) => {
                let cond = self.expr(cond, header, vars)?;
                self.branch(header, cond, body_blk, exit);
            }
            // `for (;;)`: the only way out is a break
            None => self.jump(header, body_blk),
        }

        self.loops.push(LoopFrame {
            continue_to,
            continue_edges: Vec::new(),
            break_edges: Vec::new(),
        });
        let mut body_vars = vars.clone();
        let body_end = self.stmts(body, body_blk, &mut body_vars)?;
        let frame = self.loops.pop().unwrap();

        // gather the edges that re-enter the header
        let mut latch_edges: Vec<(BlockIdx, VarMap)> = Vec::new();
        if post.is_some() {
            let mut incoming = frame.continue_edges;
            if let Some(b) = body_end {
                self.blocks[continue_to].preds.push(b);
                self.add_instr(b, InstrKind::Jump { target: continue_to });
                incoming.push((b, body_vars));
            }
            if !incoming.is_empty() {
                let mut post_vars = self.merge(continue_to, incoming);
                let (name, value) = post.as_ref().unwrap();
                let value = self.expr(value, continue_to, &post_vars)?;
                post_vars.insert(*name, value);
                self.jump(continue_to, header);
                latch_edges.push((continue_to, post_vars));
            }
        } else {
            latch_edges = frame.continue_edges;
            if let Some(b) = body_end {
                self.jump(b, header);
                latch_edges.push((b, body_vars));
            }
        }

        for (name, phi, entry_value) in pending {
            let mut edges = vec![(cur, entry_value)];
            for (b, m) in &latch_edges {
                edges.push((*b, m[&name]));
            }
            self.patch_phi(header, phi, edges);
        }

        // the loop exit merges the header's false edge with every break
        let mut incoming = Vec::new();
        if cond.is_some() {
            incoming.push((header, vars.clone()));
        }
        for (b, m) in frame.break_edges {
            self.blocks[exit].preds.push(b);
            self.add_instr(b, InstrKind::Jump { target: exit });
            incoming.push((b, m));
        }
        if incoming.is_empty() {
            // no normal exit and no break: everything after is unreachable
            return Ok(None);
        }
        *vars = self.merge(exit, incoming);
        cur = exit;
        Ok(Some(cur))
    }

    fn patch_phi(&mut self, block: BlockIdx, id: ValueId, edges: Vec<(BlockIdx, Value)>) {
        let instr = self.blocks[block]
            .instrs
            .iter_mut()
            .find(|i| i.id == id)
            .expect("phi to patch");
        instr.kind = InstrKind::Phi { edges };
    }

    fn innermost_loop(&mut self, pos: Pos, what: &str) -> Result<&mut LoopFrame> {
        if self.loops.is_empty() {
            return Err(Error::Parse {
                line: pos.line,
                col: pos.col,
                msg: format!("{what} outside of a loop"),
            });
        }
        Ok(self.loops.last_mut().unwrap())
    }

    fn expr(&mut self, e: &ExprAst, block: BlockIdx, vars: &VarMap) -> Result<Value> {
        match e {
            ExprAst::Literal(lit) => Ok(Value::Const(*lit)),
            ExprAst::Var { name, pos } => vars.get(name).copied().ok_or(Error::Parse {
                line: pos.line,
                col: pos.col,
                msg: format!("undefined variable {name:?}"),
            }),
            ExprAst::Binary { op, lhs, rhs } => {
                let lhs = self.expr(lhs, block, vars)?;
                let rhs = self.expr(rhs, block, vars)?;
                Ok(Value::Id(self.add_instr(block, InstrKind::BinOp { op: *op, lhs, rhs })))
            }
            ExprAst::Unary { op, operand } => {
                let operand = self.expr(operand, block, vars)?;
                Ok(Value::Id(self.add_instr(block, InstrKind::UnOp { op: *op, operand })))
            }
        }
    }
}

fn assigned_names(body: &[Stmt], out: &mut HashSet<NString>) {
    for stmt in body {
        match stmt {
            Stmt::Assign { name, .. } => {
                out.insert(*name);
            }
            Stmt::If { then_body, else_body, .. } => {
                assigned_names(then_body, out);
                if let Some(else_body) = else_body {
                    assigned_names(else_body, out);
                }
            }
            Stmt::While { body, .. } => assigned_names(body, out),
            Stmt::For { init, post, body, .. } => {
                if let Some((name, _)) = init {
                    out.insert(*name);
                }
                if let Some((name, _)) = post {
                    out.insert(*name);
                }
                assigned_names(body, out);
            }
            Stmt::Block(inner) => assigned_names(inner, out),
            Stmt::Return { .. } | Stmt::Break(_) | Stmt::Continue(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssa::parser::parse;

    fn lower(source: &str) -> Program {
        build_program(&parse(source).unwrap()).unwrap()
    }

    #[test]
    fn straight_line_function() {
        let program = lower("f(x) { return x + 1; }");
        let f = program.lookup("f".into()).unwrap();
        assert_eq!(f.size(), 1);
        let block = f.block(0);
        assert!(matches!(block.instrs[0].kind, InstrKind::BinOp { op: BinToken::Add, .. }));
        assert!(matches!(block.instrs[1].kind, InstrKind::Return { .. }));
    }

    #[test]
    fn if_join_gets_phi() {
        let program = lower("f(x) { y = 0; if (x > 0) { y = 1; } return y; }");
        let f = program.lookup("f".into()).unwrap();
        // entry, then, join
        assert_eq!(f.size(), 3);
        let join = f.block(2);
        assert!(join.instrs[0].kind.is_phi());
        assert_eq!(join.preds.len(), 2);
    }

    #[test]
    fn same_value_needs_no_phi() {
        let program = lower("f(x) { y = 7; if (x > 0) { z = 1; } return y; }");
        let f = program.lookup("f".into()).unwrap();
        let join = f.block(2);
        assert!(!join.instrs.iter().any(|i| i.kind.is_phi()));
    }

    #[test]
    fn while_header_phi_has_back_edge() {
        let program = lower("f(n) { i = 0; while (i < n) { i = i + 1; } return i; }");
        let f = program.lookup("f".into()).unwrap();
        // entry, header, body, exit
        assert_eq!(f.size(), 4);
        let header = f.block(1);
        let InstrKind::Phi { edges } = &header.instrs[0].kind else {
            panic!("expected header phi");
        };
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].0, 0);
        assert_eq!(edges[1].0, 2);
    }

    #[test]
    fn both_arms_returning_ends_the_block() {
        let program = lower("f(x) { if (x > 0) { return 1; } else { return -1; } }");
        let f = program.lookup("f".into()).unwrap();
        // entry, then, else; no join
        assert_eq!(f.size(), 3);
    }

    #[test]
    fn break_and_continue_edges() {
        let program = lower(
            "f(n) {
                i = 0;
                while (true) {
                    i = i + 1;
                    if (i > n) { break; }
                    continue;
                }
                return i;
            }",
        );
        let f = program.lookup("f".into()).unwrap();
        let mut jumps = 0;
        for i in 0..f.size() {
            for instr in &f.block(i).instrs {
                if matches!(instr.kind, InstrKind::Jump { .. }) {
                    jumps += 1;
                }
            }
        }
        assert!(jumps >= 3);
    }

    #[test]
    fn lowering_twice_gives_the_same_graph() {
        let source = "f(n) { i = 0; while (i < n) { i = i + 1; } return i; }";
        let first = lower(source);
        let second = lower(source);
        assert_eq!(
            format!("{:?}", first.lookup("f".into()).unwrap()),
            format!("{:?}", second.lookup("f".into()).unwrap()),
        );
    }

    #[test]
    fn undefined_variable_is_rejected() {
        let module = parse("f(x) { return q; }").unwrap();
        assert!(matches!(build_program(&module), Err(Error::Parse { .. })));
    }

    #[test]
    fn break_outside_loop_is_rejected() {
        let module = parse("f(x) { break; }").unwrap();
        assert!(matches!(build_program(&module), Err(Error::Parse { .. })));
    }
}
