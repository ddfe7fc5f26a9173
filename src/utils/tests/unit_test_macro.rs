use crate::object::{OptionFlags, OptionRegistry};
use crate::{assert_err, assert_panic, declare_option};

#[derive(Debug, Default)]
struct Knob {
    level: usize,
}

#[test]
fn test_assert_err_matches_pattern() {
    let result: Result<(), String> = Err("坏了".to_string());
    assert_err!(result);
    assert_err!(result, msg if msg.contains("坏"));
}

#[test]
#[should_panic(expected = "预期 Err")]
fn test_assert_err_rejects_ok() {
    let result: Result<usize, String> = Ok(1);
    assert_err!(result, _);
}

#[test]
fn test_assert_panic_on_duplicate_option() {
    assert_panic!({
        let mut reg = OptionRegistry::<Knob>::new("Knob");
        declare_option!(reg, Knob, level, OptionFlags::BUILD, "档位");
        declare_option!(reg, Knob, level, OptionFlags::BUILD, "档位");
    });
}
