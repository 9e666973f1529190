use byteorder::{ByteOrder, LittleEndian};

pub struct Emit(Vec<u8>);

impl Emit {
    pub fn new() -> Self {
        Emit(vec![])
    }

    pub fn write_byte(&mut self, b: u8) {
        self.0.push(b)
    }

    pub fn write_bytes(&mut self, bs: &[u8]) {
        self.0.extend_from_slice(bs);
    }

    pub fn write_i16(&mut self, i: i16) {
        let mut buf = [0; 2];
        LittleEndian::write_i16(&mut buf, i);
        self.write_bytes(&buf);
    }

    pub fn here(&self) -> usize {
        self.0.len()
    }

    pub fn patch_i16(&mut self, ix: usize, value: i16) {
        LittleEndian::write_i16(&mut self.0[ix..ix + 2], value);
    }
}

impl Into<Vec<u8>> for Emit {
    fn into(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for Emit {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Branch displacement from the displacement field at `field` to `target`.
pub fn displacement(field: usize, target: usize) -> i16 {
    let disp = target as isize - field as isize;
    assert!(disp >= i16::min_value() as isize && disp <= i16::max_value() as isize,
            "Branch from {} to {} out of range",
            field,
            target);
    disp as i16
}

// Labels

#[derive(Debug)]
pub enum Label {
    Unbound {
        patch_ixs: Vec<usize>,
    },
    Bound {
        offset: usize,
    },
}

impl Label {
    pub fn new() -> Self {
        Label::Unbound { patch_ixs: vec![] }
    }

    pub fn bind(&mut self, emit: &mut Emit) {
        *self = match self {
            &mut Label::Unbound { ref mut patch_ixs } => {
                let here = emit.here();
                for patch_ix in patch_ixs.drain(..) {
                    emit.patch_i16(patch_ix, displacement(patch_ix, here));
                }
                Label::Bound { offset: here }
            }
            &mut Label::Bound { .. } => {
                panic!("Binding a bound label: {:?}", self);
            }
        };
    }

    pub fn offset(&self) -> Option<usize> {
        match self {
            &Label::Unbound { .. } => None,
            &Label::Bound { offset } => Some(offset),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.offset().is_some()
    }

    /// Writes the displacement field for a branch to this label at the
    /// current position, leaving a placeholder to be patched by `bind` if the
    /// label is still unbound.
    pub fn write_disp(&mut self, emit: &mut Emit) {
        let here = emit.here();
        match self {
            &mut Label::Unbound { ref mut patch_ixs } => {
                patch_ixs.push(here);
                emit.write_i16(0);
            }
            &mut Label::Bound { offset } => {
                emit.write_i16(displacement(here, offset));
            }
        }
    }
}
