//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{BinaryMask, Idx2d};

pub use crate::{IfStack, ImgWriteRaw, ImgWriteVis, LabelMask};

#[cfg(feature = "plot")]
pub use crate::ImgDisplay;

pub use crate::consts::gray::{IF_BACKGROUND, IF_CYTOPLASM, IF_NUCLEUS};
pub use crate::consts::{CLIP_WINDOW, CYTO_PERCENTILES, NUCLEUS_PERCENTILES};

pub use crate::normalize::Projection;
pub use crate::quantify::{ChannelStats, MeasurementRow, RegionMeans};
pub use crate::segment::{prune_cytoplasm, segment_cytoplasm, segment_nucleus};

pub use crate::compose::compose_trinary;
pub use crate::pipeline::{cyto_mask_image, mask_image, quantify_stack};

pub use crate::dataset::home_dataset_dir_with;
pub use crate::dataset::{self, stack_loader};
