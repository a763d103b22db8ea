//! The consistency filters of the placement core: single- and multi-resource bin packing over
//! the VM bin variables, and the range/stage channeling propagators used to encode piecewise
//! resource functions.

mod bin_packing;
mod multi_bin_packing;
mod range_to_index;
mod stage_element;

pub use bin_packing::BinPackingPropagator;
pub use bin_packing::PackingDimension;
pub use multi_bin_packing::MultiBinPackingPropagator;
pub use range_to_index::RangeToIndexPropagator;
pub use stage_element::StageElementPropagator;
