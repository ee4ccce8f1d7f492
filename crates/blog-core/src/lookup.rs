//! Explicit result of a lookup by key.

/// Outcome of fetching a single row by id, slug or username.
///
/// Rows the viewer may not see are reported as `NotFound` as well, so callers
/// cannot tell the two cases apart.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }

    /// Convert into a `Result`, building the error for the `NotFound` case.
    pub fn found_or<E>(self, err: impl FnOnce() -> E) -> Result<T, E> {
        match self {
            Lookup::Found(value) => Ok(value),
            Lookup::NotFound => Err(err()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NotFound => Lookup::NotFound,
        }
    }

    /// Keep the value only if it satisfies `predicate`.
    pub fn filter(self, predicate: impl FnOnce(&T) -> bool) -> Lookup<T> {
        match self {
            Lookup::Found(value) if predicate(&value) => Lookup::Found(value),
            _ => Lookup::NotFound,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Lookup::Found(value),
            None => Lookup::NotFound,
        }
    }
}
