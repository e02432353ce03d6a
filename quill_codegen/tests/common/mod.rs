//! Reference interpreter for emitted units.
//!
//! Executes a `CompiledUnit` directly so behaviour tests can assert on
//! observable output instead of instruction listings. Console builtins
//! read from a queued input script and collect printed lines.

use std::collections::VecDeque;

use quill_codegen::builtins::Builtin;
use quill_codegen::bytecode::{CompiledBody, IntCmp};
use quill_codegen::{CompiledUnit, Instruction};
use quill_ast::{Constant, ValueKind};

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl Value {
    fn as_int(&self) -> i64 {
        match self {
            Value::Int(v) => *v,
            Value::Bool(v) => i64::from(*v),
            Value::Str(s) => panic!("expected a number, found {s:?}"),
        }
    }

    fn as_bool(&self) -> bool {
        match self {
            Value::Bool(v) => *v,
            other => panic!("expected a boolean, found {other:?}"),
        }
    }

    fn into_str(self) -> String {
        match self {
            Value::Str(s) => s,
            other => panic!("expected a string, found {other:?}"),
        }
    }
}

fn default_value(kind: ValueKind) -> Value {
    match kind {
        ValueKind::Int => Value::Int(0),
        ValueKind::Bool => Value::Bool(false),
        ValueKind::Str => Value::Str(String::new()),
        ValueKind::Void => panic!("valueless global field"),
    }
}

fn constant_value(constant: &Constant) -> Value {
    match constant {
        Constant::Int(v) => Value::Int(*v),
        Constant::Bool(v) => Value::Bool(*v),
        Constant::Str(v) => Value::Str(v.clone()),
    }
}

/// Executes one unit.
pub struct Machine<'a> {
    unit: &'a CompiledUnit,
    globals: Vec<Value>,
    input: VecDeque<String>,
    /// Lines printed so far.
    pub output: Vec<String>,
    /// Remaining `main()` restarts before the machine refuses more.
    restart_budget: usize,
    halted: bool,
}

impl<'a> Machine<'a> {
    pub fn new(unit: &'a CompiledUnit) -> Self {
        Self {
            unit,
            globals: Vec::new(),
            input: VecDeque::new(),
            output: Vec::new(),
            restart_budget: 4,
            halted: false,
        }
    }

    pub fn with_input(mut self, lines: &[&str]) -> Self {
        self.input = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Run the unit's entry body to completion and return the output.
    pub fn run(mut self) -> Vec<String> {
        self.start();
        self.output
    }

    fn start(&mut self) {
        self.globals = self
            .unit
            .globals
            .iter()
            .map(|g| g.init.as_ref().map_or_else(|| default_value(g.kind), constant_value))
            .collect();
        if let Some(entry) = self.unit.entry_body() {
            self.run_body(entry, Vec::new());
        }
    }

    fn run_body(&mut self, body: &CompiledBody, args: Vec<Value>) -> Option<Value> {
        let mut locals: Vec<Value> = vec![Value::Int(0); body.locals.len()];
        for (slot, arg) in args.into_iter().enumerate() {
            locals[slot] = arg;
        }

        let mut stack: Vec<Value> = Vec::new();
        let mut pc = 0usize;

        while pc < body.instructions.len() {
            if self.halted {
                return None;
            }
            let inst = &body.instructions[pc];
            pc += 1;
            match inst {
                Instruction::PushInt(v) => stack.push(Value::Int(*v)),
                Instruction::PushBool(v) => stack.push(Value::Bool(*v)),
                Instruction::PushStr(idx) => {
                    stack.push(Value::Str(body.strings[idx.index()].to_string()));
                }

                Instruction::LoadLocal(slot) => stack.push(locals[slot.index()].clone()),
                Instruction::StoreLocal(slot) => {
                    locals[slot.index()] = stack.pop().unwrap();
                }
                Instruction::LoadGlobal(idx) => stack.push(self.globals[idx.index()].clone()),
                Instruction::StoreGlobal(idx) => {
                    self.globals[idx.index()] = stack.pop().unwrap();
                }

                Instruction::Add
                | Instruction::Sub
                | Instruction::Mul
                | Instruction::Div
                | Instruction::Rem => {
                    let rhs = stack.pop().unwrap().as_int();
                    let lhs = stack.pop().unwrap().as_int();
                    stack.push(Value::Int(match inst {
                        Instruction::Add => lhs + rhs,
                        Instruction::Sub => lhs - rhs,
                        Instruction::Mul => lhs * rhs,
                        Instruction::Div => lhs / rhs,
                        _ => lhs % rhs,
                    }));
                }
                Instruction::Neg => {
                    let v = stack.pop().unwrap().as_int();
                    stack.push(Value::Int(-v));
                }

                Instruction::And | Instruction::Or | Instruction::Xor => {
                    let rhs = stack.pop().unwrap().as_bool();
                    let lhs = stack.pop().unwrap().as_bool();
                    stack.push(Value::Bool(match inst {
                        Instruction::And => lhs && rhs,
                        Instruction::Or => lhs || rhs,
                        _ => lhs != rhs,
                    }));
                }

                Instruction::Jump(label) => pc = body.targets[label.index()] as usize,
                Instruction::JumpIfFalse(label) => {
                    if !stack.pop().unwrap().as_bool() {
                        pc = body.targets[label.index()] as usize;
                    }
                }
                Instruction::JumpIfTrue(label) => {
                    if stack.pop().unwrap().as_bool() {
                        pc = body.targets[label.index()] as usize;
                    }
                }
                Instruction::JumpIntCmp(cmp, label) => {
                    let rhs = stack.pop().unwrap().as_int();
                    let lhs = stack.pop().unwrap().as_int();
                    let holds = match cmp {
                        IntCmp::Lt => lhs < rhs,
                        IntCmp::Le => lhs <= rhs,
                        IntCmp::Gt => lhs > rhs,
                        IntCmp::Ge => lhs >= rhs,
                        IntCmp::Eq => lhs == rhs,
                        IntCmp::Ne => lhs != rhs,
                    };
                    if holds {
                        pc = body.targets[label.index()] as usize;
                    }
                }
                Instruction::JumpStrEq(when_equal, label) => {
                    let rhs = stack.pop().unwrap().into_str();
                    let lhs = stack.pop().unwrap().into_str();
                    if (lhs == rhs) == *when_equal {
                        pc = body.targets[label.index()] as usize;
                    }
                }

                Instruction::NewAccum => stack.push(Value::Str(String::new())),
                Instruction::AccumPush => {
                    let piece = stack.pop().unwrap().into_str();
                    match stack.last_mut() {
                        Some(Value::Str(accum)) => accum.push_str(&piece),
                        other => panic!("no accumulator under {other:?}"),
                    }
                }
                Instruction::AccumFinish => {}

                Instruction::Call(idx) => {
                    let callee = &self.unit.functions[idx.index()];
                    let split = stack.len() - callee.param_count as usize;
                    let args = stack.split_off(split);
                    if let Some(value) = self.run_body(callee, args) {
                        stack.push(value);
                    }
                }
                Instruction::CallBuiltin(builtin) => {
                    if let Some(value) = self.run_builtin(*builtin, &mut stack) {
                        stack.push(value);
                    }
                }

                Instruction::Pop => {
                    stack.pop().unwrap();
                }
                Instruction::Return => return None,
                Instruction::ReturnValue => return stack.pop(),
            }
        }
        None
    }

    fn run_builtin(&mut self, builtin: Builtin, stack: &mut Vec<Value>) -> Option<Value> {
        match builtin {
            Builtin::PrintInt => {
                let v = stack.pop().unwrap().as_int();
                self.output.push(v.to_string());
                None
            }
            Builtin::PrintBool => {
                let v = stack.pop().unwrap().as_bool();
                self.output.push(v.to_string());
                None
            }
            Builtin::PrintStr => {
                let v = stack.pop().unwrap().into_str();
                self.output.push(v);
                None
            }
            Builtin::ReadInt => {
                let line = self.input.pop_front().expect("input script exhausted");
                Some(Value::Int(line.parse().expect("non-numeric input line")))
            }
            Builtin::ReadBool => {
                let line = self.input.pop_front().expect("input script exhausted");
                Some(Value::Bool(line == "true"))
            }
            Builtin::ReadStr => {
                let line = self.input.pop_front().expect("input script exhausted");
                Some(Value::Str(line))
            }
            Builtin::StrToInt => {
                let v = stack.pop().unwrap().into_str();
                Some(Value::Int(v.trim().parse().unwrap_or(0)))
            }
            Builtin::IntToStr => {
                let v = stack.pop().unwrap().as_int();
                Some(Value::Str(v.to_string()))
            }
            Builtin::Restart => {
                // The unit name travels as a hidden trailing argument.
                let name = stack.pop().unwrap().into_str();
                assert_eq!(name, &*self.unit.name);
                if self.restart_budget == 0 {
                    self.halted = true;
                } else {
                    self.restart_budget -= 1;
                    self.start();
                    self.halted = true;
                }
                None
            }
            Builtin::Exit => {
                let _code = stack.pop().unwrap().as_int();
                self.halted = true;
                None
            }
        }
    }
}
