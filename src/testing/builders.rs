//! Fluent builder for small symbolic-graph fixtures.

use crate::arena::ConcreteTensor;
use crate::organizer::{PreBind, SymbolOrganizer};
use crate::symbol::{ExecId, ExecSymbol, MemType, TensorId, TensorSymbol};
use std::sync::Arc;

/// Builds a [`SymbolOrganizer`] one tensor/exec at a time.
///
/// # Example
///
/// ```
/// use arenac::testing::GraphBuilder;
///
/// let mut g = GraphBuilder::new();
/// let t0 = g.tensor(&[4]);
/// let t1 = g.tensor(&[4]);
/// let e0 = g.exec(&[t0], &[t1], false);
/// g.source(e0);
/// g.destination(e0);
/// let organizer = g.build();
/// ```
#[derive(Default)]
pub struct GraphBuilder {
    tensors: Vec<TensorSymbol>,
    execs: Vec<ExecSymbol>,
    sources: Vec<ExecId>,
    destinations: Vec<ExecId>,
    prebinds: Vec<PreBind>,
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host tensor with the given shape and a 4-byte element size.
    #[must_use]
    pub fn tensor(&mut self, dims: &[usize]) -> TensorId {
        let id = TensorId::new(self.tensors.len() as u32);
        self.tensors.push(TensorSymbol {
            dims: dims.iter().copied().collect(),
            mem_type: MemType::Host,
            device_id: 0,
            elem_size: 4,
            alias_of: None,
            init_to_zero: false,
        });
        id
    }

    /// Add a tensor that is a view into `parent`'s storage.
    #[must_use]
    pub fn alias(&mut self, parent: TensorId, dims: &[usize]) -> TensorId {
        let id = self.tensor(dims);
        self.tensors[id.index()].alias_of = Some(parent);
        id
    }

    /// Mark an existing tensor as zero-initialized before its first use.
    pub fn zero_init(&mut self, id: TensorId) -> &mut Self {
        self.tensors[id.index()].init_to_zero = true;
        self
    }

    /// Add an exec invoking `inputs -> outputs`. Wire successors afterwards
    /// with [`GraphBuilder::link`].
    #[must_use]
    pub fn exec(&mut self, inputs: &[TensorId], outputs: &[TensorId], inplace: bool) -> ExecId {
        let id = ExecId::new(self.execs.len() as u32);
        self.execs.push(ExecSymbol {
            cmd: Arc::new(()),
            hint: Arc::new(()),
            inputs: inputs.to_vec(),
            outputs: outputs.to_vec(),
            inplace,
            successors: Vec::new(),
        });
        id
    }

    pub fn link(&mut self, from: ExecId, to: ExecId) -> &mut Self {
        self.execs[from.index()].successors.push(to);
        self
    }

    pub fn source(&mut self, id: ExecId) -> &mut Self {
        self.sources.push(id);
        self
    }

    pub fn destination(&mut self, id: ExecId) -> &mut Self {
        self.destinations.push(id);
        self
    }

    pub fn prebind(&mut self, symbol: TensorId, tensor: ConcreteTensor) -> &mut Self {
        self.prebinds.push(PreBind { symbol, tensor });
        self
    }

    #[must_use]
    pub fn build(self) -> SymbolOrganizer {
        SymbolOrganizer {
            tensors: self.tensors,
            execs: self.execs,
            sources: self.sources,
            destinations: self.destinations,
            prebinds: self.prebinds,
        }
    }
}
