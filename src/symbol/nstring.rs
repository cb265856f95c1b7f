use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::fmt::Display;
use std::ops::Add;

/// Used to manage String. Reduce allocation for String
#[derive(Default)]
struct StringPool {
    strings: Vec<String>,
    string_map: HashMap<String, usize>,
}

impl StringPool {
    fn get_string(&self, i: usize) -> String {
        assert!(i < self.strings.len());
        self.strings[i].clone()
    }

    fn get_id(&mut self, s: &str) -> usize {
        if let Some(&i) = self.string_map.get(s) {
            return i;
        }
        self.strings.push(s.to_string());
        self.string_map.insert(s.to_string(), self.strings.len() - 1);
        self.strings.len() - 1
    }
}

thread_local! {
    static STRING_POOL: RefCell<StringPool> = RefCell::new(StringPool::default());
}

/// A copyable handle into the interned string pool. Identifiers all over
/// the engine (variable names, function names, solver interning keys) are
/// `NString`s, so equality and hashing are on a single `usize`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NString(usize);

impl NString {
    pub fn contains(&self, sub: NString) -> bool {
        let s = self.to_string();
        s.contains(&sub.to_string())
    }
}

impl PartialEq<&str> for NString {
    fn eq(&self, other: &&str) -> bool {
        *self == NString::from(*other)
    }
}

impl Add for NString {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        self + rhs.to_string()
    }
}

impl Add<String> for NString {
    type Output = Self;
    fn add(self, rhs: String) -> Self::Output {
        self + rhs.as_str()
    }
}

impl Add<&str> for NString {
    type Output = Self;
    fn add(self, rhs: &str) -> Self::Output {
        let new_string = self.to_string() + rhs;
        NString::from(new_string)
    }
}

impl Debug for NString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", STRING_POOL.with(|p| p.borrow().get_string(self.0)))
    }
}

impl Display for NString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl From<String> for NString {
    fn from(value: String) -> Self {
        NString::from(value.as_str())
    }
}

impl From<&str> for NString {
    fn from(value: &str) -> Self {
        NString(STRING_POOL.with(|p| p.borrow_mut().get_id(value)))
    }
}
