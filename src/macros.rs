//! Macros for ergonomic emission
//!
//! Listener arguments are a `Vec<Payload>`; these macros convert each
//! argument with `Payload::from` so call sites can pass plain values.

/// Build a listener argument list
///
/// # Examples
///
/// ```rust
/// use async_emitter::{args, Payload};
///
/// let args = args!["a", 1, true];
/// assert_eq!(args.len(), 3);
/// assert_eq!(args[0], Payload::from("a"));
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        ::std::vec![$($crate::Payload::from($arg)),*]
    };
}

/// Emit an event on a dispatcher and await its results
///
/// # Examples
///
/// ```rust
/// use async_emitter::prelude::*;
///
/// # async fn example() -> async_emitter::Result<()> {
/// let dispatcher = Dispatcher::new();
/// dispatcher
///     .on("greet", Listener::sync(|args| Ok(args.into_iter().next())))
///     .await?;
///
/// // Emit with no arguments
/// let results = emit!(dispatcher, "greet")?;
/// assert!(results.is_empty());
///
/// // Emit with positional arguments
/// let results = emit!(dispatcher, "greet", "Hello", "World")?;
/// assert_eq!(results, vec![Some(Payload::from("Hello"))]);
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! emit {
    // Basic usage: emit!(dispatcher, event)
    ($dispatcher:expr, $event:expr $(,)?) => {
        $dispatcher.emit($event, ::std::vec::Vec::new()).await
    };

    // With arguments: emit!(dispatcher, event, arg1, arg2, ...)
    ($dispatcher:expr, $event:expr, $($arg:expr),+ $(,)?) => {
        $dispatcher.emit($event, $crate::args![$($arg),+]).await
    };
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn test_args_macro() {
        let empty: Vec<Payload> = crate::args![];
        assert!(empty.is_empty());

        let args = crate::args!["a", 2, false];
        assert_eq!(
            args,
            vec![Payload::from("a"), Payload::from(2), Payload::from(false)]
        );
    }

    #[tokio::test]
    async fn test_emit_macro() {
        let dispatcher = Dispatcher::new();
        dispatcher
            .on("foo", Listener::sync(|args| Ok(Some(Payload::from(args.len() as u64)))))
            .await
            .unwrap();

        let results = crate::emit!(dispatcher, "foo").unwrap();
        assert_eq!(results, vec![Some(Payload::from(0u64))]);

        let results = crate::emit!(dispatcher, "foo", "a", "b", "c").unwrap();
        assert_eq!(results, vec![Some(Payload::from(3u64))]);
    }
}
