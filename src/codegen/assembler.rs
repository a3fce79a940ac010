use crate::{codegen::opcode::Opcode, error::ResourceError};

/// Highest offset a `PUSH2` jump target can encode.
pub const MAX_JUMP_TARGET: usize = u16::MAX as usize;

/// A symbolic code position, bound by [`Assembler::jumpdest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Label(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instr {
    Op(Opcode),
    /// A push with the narrowest width which holds the value.
    Push(u32),
    /// A push of a given width, whatever the value. Only the low bytes are
    /// kept.
    PushFixed(Opcode, u32),
    /// A push of a label's offset. Always `PUSH2`, so that its size is known
    /// before the offset is.
    PushLabel(Label),
    /// A `JUMPDEST` which binds the label to its own offset.
    JumpDest(Label),
}

impl Instr {
    fn size(self) -> usize {
        match self {
            Instr::Op(op) => 1 + op.immediate_len(),
            Instr::Push(value) => 1 + Opcode::narrowest_push(value).immediate_len(),
            Instr::PushFixed(op, _) => 1 + op.immediate_len(),
            Instr::PushLabel(_) => 3,
            Instr::JumpDest(_) => 1,
        }
    }
}

/// Collects instructions with symbolic jump targets and serializes them in two
/// passes: the first computes every label offset from instruction sizes alone,
/// the second writes the bytes.
#[derive(Debug, Default)]
pub struct Assembler {
    instrs: Vec<Instr>,
    labels: usize,
}

impl Assembler {
    pub fn new() -> Assembler {
        Assembler::default()
    }

    pub fn new_label(&mut self) -> Label {
        self.labels += 1;
        Label(self.labels - 1)
    }

    pub fn op(&mut self, op: Opcode) -> &mut Self {
        debug_assert_eq!(op.immediate_len(), 0, "use push for {op}");
        self.instrs.push(Instr::Op(op));
        self
    }

    pub fn push(&mut self, value: u32) -> &mut Self {
        self.instrs.push(Instr::Push(value));
        self
    }

    pub fn push_fixed(&mut self, push: Opcode, value: u32) -> &mut Self {
        debug_assert!(push.immediate_len() > 0, "{push} is not a push");
        self.instrs.push(Instr::PushFixed(push, value));
        self
    }

    pub fn push_label(&mut self, label: Label) -> &mut Self {
        self.instrs.push(Instr::PushLabel(label));
        self
    }

    pub fn jumpdest(&mut self, label: Label) -> &mut Self {
        self.instrs.push(Instr::JumpDest(label));
        self
    }

    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }

    /// First pass. Returns the offset of every label, indexed by label, and
    /// the total code size.
    pub fn layout(&self) -> (Vec<Option<usize>>, usize) {
        let mut offsets = vec![None; self.labels];
        let mut offset = 0;
        for instr in &self.instrs {
            if let Instr::JumpDest(Label(id)) = *instr {
                debug_assert!(offsets[id].is_none(), "label bound twice");
                offsets[id] = Some(offset);
            }
            offset += instr.size();
        }
        (offsets, offset)
    }

    /// Second pass. Fails if a jump target doesn't fit its `PUSH2`.
    pub fn assemble(&self) -> Result<Vec<u8>, ResourceError> {
        let (offsets, len) = self.layout();
        let mut code = Vec::with_capacity(len);

        for instr in &self.instrs {
            match *instr {
                Instr::Op(op) => code.push(op.into()),
                Instr::Push(value) => {
                    emit_push(&mut code, Opcode::narrowest_push(value), value);
                }
                Instr::PushFixed(push, value) => emit_push(&mut code, push, value),
                Instr::PushLabel(Label(id)) => {
                    let target = offsets[id].expect("label must be bound before assembling");
                    if target > MAX_JUMP_TARGET {
                        return Err(ResourceError::CodeTooLarge {
                            len,
                            limit: MAX_JUMP_TARGET,
                        });
                    }
                    // In range, checked above.
                    #[allow(clippy::cast_possible_truncation)]
                    emit_push(&mut code, Opcode::PUSH2, target as u32);
                }
                Instr::JumpDest(_) => code.push(Opcode::JUMPDEST.into()),
            }
        }

        debug_assert_eq!(code.len(), len);
        log::trace!("assembled {} instructions into {len} bytes", self.instrs.len());
        Ok(code)
    }
}

fn emit_push(code: &mut Vec<u8>, push: Opcode, value: u32) {
    let width = push.immediate_len();
    code.push(push.into());
    code.extend_from_slice(&value.to_be_bytes()[4 - width..]);
}
