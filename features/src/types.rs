//! Feature data model shared by the extractor and the emitters.

use std::collections::HashMap;
use std::sync::Arc;

use skein_ir::{Expr, Var};

use crate::access::AccessKind;
use crate::config::ARITH_INTENSITY_CURVE_SAMPLE_N;
use crate::reuse::ReuseKind;

/// Position encoding of a loop annotation relative to the iteration space.
///
/// The extractor currently reports only `None` / `Mixed`: the finer spatial
/// and reduce tags need operation-level axis information which the lowered
/// IR no longer carries. The remaining variants stay in the schema so the
/// one-hot layout (and any model trained on it) is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumCount)]
pub enum AnnotationPos {
    None = 0,
    InnerSpatial = 1,
    MiddleSpatial = 2,
    OuterSpatial = 3,
    InnerReduce = 4,
    MiddleReduce = 5,
    OuterReduce = 6,
    Mixed = 7,
}

/// What pushed a frame onto the loop stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Serial,
    Parallel,
    Vectorized,
    Unrolled,
    /// Injected by a GPU thread-extent or virtual-thread scope so region
    /// and reuse analysis see the parallel axis as an enclosing loop.
    SyntheticThread,
}

/// One enclosing loop of the current walk.
#[derive(Debug, Clone)]
pub struct LoopFrame {
    /// Identity of this frame within one extraction walk.
    pub id: u64,
    pub var: Var,
    pub min: Arc<Expr>,
    /// Constant extent, clamped to 1 when not a constant.
    pub extent: i64,
    pub kind: FrameKind,
}

/// `(access kind, touched element count, element bytes)` observed for a
/// buffer under one loop frame.
pub type RegionEntry = (AccessKind, i64, i64);

/// For one loop frame: every buffer touched in its subtree, with one entry
/// per store visit that reached the frame.
pub type PerLoopRegionTable = HashMap<u64, Vec<RegionEntry>>;

/// Per-frame region tables for the whole walk, keyed by frame id.
pub type TouchRegionMap = HashMap<u64, PerLoopRegionTable>;

/// Features of one buffer access within one store.
#[derive(Debug, Clone)]
pub struct BufferAccessFeature {
    pub buffer_name: String,
    pub acc_kind: AccessKind,
    /// Touched memory in bytes.
    pub bytes: f32,
    /// Touched unique memory in bytes.
    pub unique_bytes: f32,
    /// Touched cache lines.
    pub lines: f32,
    /// Touched unique cache lines.
    pub unique_lines: f32,
    pub reuse_kind: ReuseKind,
    /// Reuse distance in iterations.
    pub reuse_dis_iter: f32,
    /// Reuse distance in touched bytes.
    pub reuse_dis_bytes: f32,
    /// Number of reuses.
    pub reuse_ct: f32,
    pub bytes_d_reuse_ct: f32,
    pub unique_bytes_d_reuse_ct: f32,
    pub lines_d_reuse_ct: f32,
    pub unique_lines_d_reuse_ct: f32,
    /// Stride of the access in elements.
    pub stride: f32,
}

/// Everything extracted for one buffer-store statement.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    // Math op counts, scaled by the product of enclosing loop extents.
    pub float_mad: f32,
    pub float_addsub: f32,
    pub float_mul: f32,
    pub float_divmod: f32,
    pub float_cmp: f32,
    pub float_math_func: f32,
    pub float_other_func: f32,
    pub int_mad: f32,
    pub int_addsub: f32,
    pub int_mul: f32,
    pub int_divmod: f32,
    pub int_cmp: f32,
    pub int_math_func: f32,
    pub int_other_func: f32,
    pub bool_op: f32,
    pub select_op: f32,

    // Loop annotation structure.
    pub vec_num: f32,
    pub vec_prod: f32,
    pub vec_len: f32,
    pub vec_pos: AnnotationPos,
    pub unroll_num: f32,
    pub unroll_prod: f32,
    pub unroll_len: f32,
    pub unroll_pos: AnnotationPos,
    pub parallel_num: f32,
    pub parallel_prod: f32,
    pub parallel_len: f32,
    pub parallel_pos: AnnotationPos,

    // GPU context.
    pub is_gpu: bool,
    pub block_idx_x_len: f32,
    pub block_idx_y_len: f32,
    pub block_idx_z_len: f32,
    pub thread_idx_x_len: f32,
    pub thread_idx_y_len: f32,
    pub thread_idx_z_len: f32,
    pub vthread_len: f32,

    /// Arithmetic intensity at evenly spaced compute-op grid points.
    pub arith_intensity_curve: [f32; ARITH_INTENSITY_CURVE_SAMPLE_N],

    /// Per-buffer access features, one per touched buffer.
    pub access_feas: Vec<BufferAccessFeature>,

    // Allocation features from the enclosing buffer realization.
    pub alloc_size: f32,
    pub alloc_outer_prod: f32,
    pub alloc_inner_prod: f32,
    pub alloc_prod: f32,

    // Overall features.
    pub outer_prod: f32,
    pub num_loops: f32,
    pub auto_unroll_max_step: f32,
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self {
            float_mad: 0.0,
            float_addsub: 0.0,
            float_mul: 0.0,
            float_divmod: 0.0,
            float_cmp: 0.0,
            float_math_func: 0.0,
            float_other_func: 0.0,
            int_mad: 0.0,
            int_addsub: 0.0,
            int_mul: 0.0,
            int_divmod: 0.0,
            int_cmp: 0.0,
            int_math_func: 0.0,
            int_other_func: 0.0,
            bool_op: 0.0,
            select_op: 0.0,
            vec_num: 0.0,
            vec_prod: 0.0,
            vec_len: 0.0,
            vec_pos: AnnotationPos::None,
            unroll_num: 0.0,
            unroll_prod: 0.0,
            unroll_len: 0.0,
            unroll_pos: AnnotationPos::None,
            parallel_num: 0.0,
            parallel_prod: 0.0,
            parallel_len: 0.0,
            parallel_pos: AnnotationPos::None,
            is_gpu: false,
            block_idx_x_len: 1.0,
            block_idx_y_len: 1.0,
            block_idx_z_len: 1.0,
            thread_idx_x_len: 1.0,
            thread_idx_y_len: 1.0,
            thread_idx_z_len: 1.0,
            vthread_len: 1.0,
            arith_intensity_curve: [0.0; ARITH_INTENSITY_CURVE_SAMPLE_N],
            access_feas: Vec::new(),
            alloc_size: 0.0,
            alloc_outer_prod: 0.0,
            alloc_inner_prod: 0.0,
            alloc_prod: 0.0,
            outer_prod: 0.0,
            num_loops: 0.0,
            auto_unroll_max_step: 0.0,
        }
    }
}
