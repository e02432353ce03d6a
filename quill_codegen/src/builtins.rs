//! Builtin function registry.
//!
//! Builtins are resolved by `(name, argument-kind signature)` against an
//! explicit table built at startup. One builtin (`main`, which restarts the
//! unit from the top) needs to know which unit it lives in; that is supplied
//! through [`UnitContext`], an explicit parameter on the call-emission path,
//! not ambient state.

use quill_ast::ValueKind;
use rustc_hash::FxHashMap;

/// Identifier of a builtin operation, as carried in the instruction stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `putout(int)` - print an integer.
    PrintInt,
    /// `putout(bool)` - print a boolean.
    PrintBool,
    /// `putout(str)` - print text.
    PrintStr,
    /// `putinInt()` - read an integer.
    ReadInt,
    /// `putinBoolie()` - read a boolean.
    ReadBool,
    /// `putinString()` - read a line of text.
    ReadStr,
    /// `stoi(str)` - parse an integer.
    StrToInt,
    /// `itos(int)` - format an integer.
    IntToStr,
    /// `main()` - restart the unit from its entry point.
    /// Pops the unit name pushed by the emitter.
    Restart,
    /// `exit(int)` - terminate execution.
    Exit,
}

/// A resolved builtin overload.
#[derive(Debug, Clone)]
pub struct BuiltinDescriptor {
    /// Operation id.
    pub id: Builtin,
    /// Parameter kinds, in order.
    pub params: &'static [ValueKind],
    /// Return kind.
    pub returns: ValueKind,
    /// Whether the call site must supply the ambient unit context.
    pub needs_unit_context: bool,
}

/// Ambient invocation parameters for the one builtin that needs them.
#[derive(Debug, Clone, Copy)]
pub struct UnitContext<'a> {
    /// Externally visible name of the unit being generated.
    pub unit_name: &'a str,
}

/// Registry of builtin overloads, keyed by name.
#[derive(Debug)]
pub struct BuiltinRegistry {
    overloads: FxHashMap<&'static str, Vec<BuiltinDescriptor>>,
}

impl BuiltinRegistry {
    /// Build the registry of all known builtins.
    pub fn new() -> Self {
        use ValueKind::{Bool, Int, Str, Void};

        let mut overloads: FxHashMap<&'static str, Vec<BuiltinDescriptor>> = FxHashMap::default();
        let mut add = |name: &'static str, desc: BuiltinDescriptor| {
            overloads.entry(name).or_default().push(desc);
        };

        let plain = |id, params, returns| BuiltinDescriptor {
            id,
            params,
            returns,
            needs_unit_context: false,
        };

        add("putout", plain(Builtin::PrintInt, &[Int], Void));
        add("putout", plain(Builtin::PrintBool, &[Bool], Void));
        add("putout", plain(Builtin::PrintStr, &[Str], Void));
        add("putinInt", plain(Builtin::ReadInt, &[], Int));
        add("putinBoolie", plain(Builtin::ReadBool, &[], Bool));
        add("putinString", plain(Builtin::ReadStr, &[], Str));
        add("stoi", plain(Builtin::StrToInt, &[Str], Int));
        add("itos", plain(Builtin::IntToStr, &[Int], Str));
        add("exit", plain(Builtin::Exit, &[Int], Void));
        add(
            "main",
            BuiltinDescriptor {
                id: Builtin::Restart,
                params: &[],
                returns: Void,
                needs_unit_context: true,
            },
        );

        Self { overloads }
    }

    /// Resolve a call site against the registry.
    ///
    /// Returns `None` when no overload of `name` accepts exactly `args`.
    pub fn resolve(&self, name: &str, args: &[ValueKind]) -> Option<&BuiltinDescriptor> {
        self.overloads
            .get(name)?
            .iter()
            .find(|d| d.params == args)
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ValueKind::{Bool, Int, Str};

    #[test]
    fn test_overload_resolution() {
        let reg = BuiltinRegistry::new();
        assert_eq!(reg.resolve("putout", &[Int]).unwrap().id, Builtin::PrintInt);
        assert_eq!(
            reg.resolve("putout", &[Bool]).unwrap().id,
            Builtin::PrintBool
        );
        assert_eq!(reg.resolve("putout", &[Str]).unwrap().id, Builtin::PrintStr);
    }

    #[test]
    fn test_signature_mismatch_is_none() {
        let reg = BuiltinRegistry::new();
        assert!(reg.resolve("putout", &[Int, Int]).is_none());
        assert!(reg.resolve("stoi", &[Int]).is_none());
        assert!(reg.resolve("nope", &[]).is_none());
    }

    #[test]
    fn test_restart_needs_unit_context() {
        let reg = BuiltinRegistry::new();
        let desc = reg.resolve("main", &[]).unwrap();
        assert_eq!(desc.id, Builtin::Restart);
        assert!(desc.needs_unit_context);
        assert!(!reg.resolve("exit", &[Int]).unwrap().needs_unit_context);
    }
}
