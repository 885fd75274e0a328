#![cfg(test)]

use serial_test::serial;

use super::*;
use crate::environment::loader::LoaderEnvVar;

const VAR: LoaderEnvVar = LoaderEnvVar::MaxArrayLen;

#[test]
#[serial]
fn nested_guards_unwind_in_order() {
    let _clear = EnvVarGuard::unset(VAR);
    {
        let _outer = EnvVarGuard::set(VAR, "10");
        {
            let _inner = EnvVarGuard::set(VAR, "20");
            assert_eq!(Environment::get(VAR).as_deref(), Some("20"));
        }
        assert_eq!(Environment::get(VAR).as_deref(), Some("10"));
        {
            let _gone = EnvVarGuard::unset(VAR);
            assert_eq!(Environment::get(VAR), None);
        }
        assert_eq!(Environment::get(VAR).as_deref(), Some("10"));
    }
    assert_eq!(Environment::get(VAR), None);
}
