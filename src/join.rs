//! The part of component A (§3, §4.A) the standard library has no
//! equivalent for: `join`, which composes a driver call with its
//! preconditions, and `flatten`, which sequences a fallible step over a
//! container. Every gated telescope method in [`crate::telescope`] is one
//! `join` call: the gates run left to right, the first `Err` wins, and the
//! driver closure only runs once every gate is `Ok`.

use crate::error::AlpacaResult;

/// `join(f)`: no gates, just run `f`. Exists so call sites with zero
/// preconditions (there are none in the telescope facade, but the macro
/// below wants a base case) still type-check.
pub fn join0<T>(f: impl FnOnce() -> AlpacaResult<T>) -> AlpacaResult<T> {
    f()
}

macro_rules! join_n {
    ($name:ident, $($gate:ident),+) => {
        /// Evaluate the gates left to right; the first `Err` is returned
        /// verbatim and `f` is never invoked. If every gate is `Ok`, `f` is
        /// called and its `Result` returned directly (the "flattened at
        /// one level" rule in spec.md §3).
        pub fn $name<T>(
            f: impl FnOnce() -> AlpacaResult<T>,
            $($gate: AlpacaResult<()>),+
        ) -> AlpacaResult<T> {
            $($gate?;)+
            f()
        }
    };
}

join_n!(join1, g1);
join_n!(join2, g1, g2);
join_n!(join3, g1, g2, g3);
join_n!(join4, g1, g2, g3, g4);
join_n!(join5, g1, g2, g3, g4, g5);
join_n!(join6, g1, g2, g3, g4, g5, g6);

/// Run `f` over each item of `items` left to right, stopping at the first
/// `Err` and returning it. On success, collects the mapped values in order.
pub fn flatten<T, U>(
    items: impl IntoIterator<Item = T>,
    mut f: impl FnMut(T) -> AlpacaResult<U>,
) -> AlpacaResult<Vec<U>> {
    items.into_iter().map(&mut f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn join_short_circuits_on_leftmost_err() {
        let calls = std::cell::Cell::new(0);
        let result = join3(
            || {
                calls.set(calls.get() + 1);
                Ok(42)
            },
            Ok(()),
            Err(Error::not_connected()),
            Err(Error::invalid_value("unreachable")),
        );
        assert_eq!(result.unwrap_err().kind, crate::error::ErrorKind::NotConnected);
        assert_eq!(calls.get(), 0, "f must not run when a gate fails");
    }

    #[test]
    fn join_runs_f_when_all_gates_ok() {
        let result = join2(|| Ok::<_, Error>(7), Ok(()), Ok(()));
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn flatten_stops_at_first_err() {
        let seen = std::cell::RefCell::new(Vec::new());
        let result = flatten([1, 2, 3, 4], |x| {
            seen.borrow_mut().push(x);
            if x == 3 {
                Err(Error::invalid_value("three"))
            } else {
                Ok(x * 10)
            }
        });
        assert!(result.is_err());
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }
}
