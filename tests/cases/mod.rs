use once_cell::sync::Lazy;
use sable::{Engine, Error, FailureMode, MapContext, Value};

/// Strict engine shared by every case in a test binary.
pub static ENGINE: Lazy<Engine> = Lazy::new(|| {
    Engine::builder()
        .failure_mode(FailureMode::Strict)
        .build()
        .expect("default options are valid")
});

/// Compile `input` as a script and run it with the given variables.
pub fn run_script(input: &str, vars: &[(&str, Value)]) -> Result<Value, Error> {
    let script = ENGINE.compile_script(input)?;
    let mut ctx: MapContext = vars
        .iter()
        .map(|(name, value)| (*name, value.clone()))
        .collect();
    script.execute(&mut ctx)
}

/// Declares one script test.
///
/// ```ignore
/// test_case!(
///     name,
///     input: "a + 1",
///     vars: [("a", Value::Int(1))],
///     result: Ok(Value::Int(2)),
/// );
/// ```
///
/// `result` is either `Ok(value)` or `Err(pattern)` matched against
/// [`sable::Error`].
#[macro_export]
macro_rules! test_case {
    (
        $name:ident,
        input: $input:expr,
        $(vars: [$(($var:expr, $value:expr)),* $(,)?],)?
        result: Ok($expected:expr) $(,)?
    ) => {
        #[test]
        fn $name() {
            let vars: Vec<(&str, sable::Value)> = vec![$($(($var, sable::Value::from($value))),*)?];
            let result = $crate::cases::run_script($input, &vars);
            pretty_assertions::assert_eq!(result.unwrap(), sable::Value::from($expected));
        }
    };
    (
        $name:ident,
        input: $input:expr,
        $(vars: [$(($var:expr, $value:expr)),* $(,)?],)?
        result: Err($pattern:pat) $(,)?
    ) => {
        #[test]
        fn $name() {
            let vars: Vec<(&str, sable::Value)> = vec![$($(($var, sable::Value::from($value))),*)?];
            let result = $crate::cases::run_script($input, &vars);
            assert!(
                matches!(result, Err($pattern)),
                "unexpected result: {:?}",
                result
            );
        }
    };
}
