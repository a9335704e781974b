//! The per-store feature extraction walk.
//!
//! One recursive pass over the lowered statement tree. Loop and
//! attribute-scope nodes push context on the way in and restore it on the
//! way out (on every path, including the error path, so an aborted record
//! never leaves a stack unbalanced); store nodes snapshot the context into
//! a [`FeatureSet`] for their destination buffer.

use std::collections::HashMap;
use std::sync::Arc;

use skein_ir::error::UnknownThreadAxisSnafu;
use skein_ir::{AttrKey, BoundAnalyzer, Buffer, Expr, ForKind, OpEffectTable, RealizeBound, Stmt, Var};

use crate::access::{AccessCollector, AccessKind};
use crate::config::{FeatureConfig, ARITH_INTENSITY_CURVE_SAMPLE_N};
use crate::emit;
use crate::error::Result;
use crate::mathops::count_math_ops;
use crate::region::{region_elems, region_extents};
use crate::reuse::compute_reuse;
use crate::stride::access_stride;
use crate::types::{AnnotationPos, BufferAccessFeature, FeatureSet, FrameKind, LoopFrame, TouchRegionMap};

/// Constant loop extent, clamped to 1 when not a constant.
fn extent_or_one(expr: &Expr) -> i64 {
    expr.as_const_int().unwrap_or(1)
}

/// Per-buffer feature sets in the order stores were first encountered.
///
/// A later store to the same destination overwrites the earlier one's
/// store-derived fields in place (the update part of a reduction wins over
/// its init part) without disturbing the emission order.
#[derive(Debug, Default)]
pub(crate) struct FeatureMap {
    sets: Vec<(Buffer, FeatureSet)>,
    index: HashMap<u64, usize>,
}

impl FeatureMap {
    fn entry(&mut self, buffer: &Buffer) -> &mut FeatureSet {
        let slot = *self.index.entry(buffer.id()).or_insert_with(|| {
            self.sets.push((buffer.clone(), FeatureSet::default()));
            self.sets.len() - 1
        });
        &mut self.sets[slot].1
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &(Buffer, FeatureSet)> {
        self.sets.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.sets.len()
    }

    fn into_sets(self) -> Vec<(Buffer, FeatureSet)> {
        self.sets
    }
}

/// GPU-context slot touched by a thread attribute scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ThreadSlot {
    BlockX,
    BlockY,
    BlockZ,
    ThreadX,
    ThreadY,
    ThreadZ,
    VThread,
}

fn thread_slot(name: &str) -> Option<ThreadSlot> {
    match name {
        "blockIdx.x" => Some(ThreadSlot::BlockX),
        "blockIdx.y" => Some(ThreadSlot::BlockY),
        "blockIdx.z" => Some(ThreadSlot::BlockZ),
        "threadIdx.x" => Some(ThreadSlot::ThreadX),
        "threadIdx.y" => Some(ThreadSlot::ThreadY),
        "threadIdx.z" => Some(ThreadSlot::ThreadZ),
        _ => None,
    }
}

pub(crate) struct PerStoreExtractor<'a> {
    cache_line_size: i64,
    effects: &'a OpEffectTable,

    pub(crate) outer_loop_prod: i64,
    loop_stack: Vec<LoopFrame>,
    vec_extents: Vec<i64>,
    unroll_extents: Vec<i64>,
    parallel_extents: Vec<i64>,

    is_gpu: bool,
    block_idx_x_len: i64,
    block_idx_y_len: i64,
    block_idx_z_len: i64,
    thread_idx_x_len: i64,
    thread_idx_y_len: i64,
    thread_idx_z_len: i64,
    vthread_len: i64,
    cur_auto_unroll_max_step: i64,

    next_frame_id: u64,
    touch_regions: TouchRegionMap,
    pub(crate) features: FeatureMap,
}

impl<'a> PerStoreExtractor<'a> {
    pub(crate) fn new(cache_line_size: i64, effects: &'a OpEffectTable) -> Self {
        Self {
            cache_line_size,
            effects,
            outer_loop_prod: 1,
            loop_stack: Vec::new(),
            vec_extents: Vec::new(),
            unroll_extents: Vec::new(),
            parallel_extents: Vec::new(),
            is_gpu: false,
            block_idx_x_len: 1,
            block_idx_y_len: 1,
            block_idx_z_len: 1,
            thread_idx_x_len: 1,
            thread_idx_y_len: 1,
            thread_idx_z_len: 1,
            vthread_len: 1,
            cur_auto_unroll_max_step: 0,
            next_frame_id: 0,
            touch_regions: TouchRegionMap::new(),
            features: FeatureMap::default(),
        }
    }

    pub(crate) fn walk(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Seq(stmts) => {
                for stmt in stmts {
                    self.walk(stmt)?;
                }
                Ok(())
            }
            Stmt::Evaluate(_) => Ok(()),
            Stmt::For { var, min, extent, kind, body } => self.visit_for(var, min, extent, *kind, body),
            Stmt::Attr { key, var, value, body } => self.visit_attr(*key, var, value, body),
            Stmt::Realize { buffer, bounds, body } => self.visit_realize(buffer, bounds, body),
            Stmt::Store { buffer, indices, value } => self.visit_store(buffer, indices, value),
        }
    }

    fn push_frame(&mut self, var: &Var, min: &Arc<Expr>, extent: i64, kind: FrameKind) {
        let id = self.next_frame_id;
        self.next_frame_id += 1;
        self.outer_loop_prod = self.outer_loop_prod.saturating_mul(extent);
        self.loop_stack.push(LoopFrame { id, var: var.clone(), min: min.clone(), extent, kind });
    }

    fn pop_frame(&mut self) {
        let frame = self.loop_stack.pop().expect("loop stack underflow");
        self.outer_loop_prod /= frame.extent;
    }

    fn visit_for(&mut self, var: &Var, min: &Arc<Expr>, extent: &Arc<Expr>, kind: ForKind, body: &Stmt) -> Result<()> {
        let extent = extent_or_one(extent);

        let frame_kind = match kind {
            ForKind::Serial => FrameKind::Serial,
            ForKind::Parallel => {
                self.parallel_extents.push(extent);
                FrameKind::Parallel
            }
            ForKind::Vectorized => {
                self.vec_extents.push(extent);
                FrameKind::Vectorized
            }
            ForKind::Unrolled => {
                self.unroll_extents.push(extent);
                FrameKind::Unrolled
            }
        };

        self.push_frame(var, min, extent, frame_kind);
        let result = self.walk(body);
        self.pop_frame();

        match kind {
            ForKind::Serial => {}
            ForKind::Parallel => {
                self.parallel_extents.pop();
            }
            ForKind::Vectorized => {
                self.vec_extents.pop();
            }
            ForKind::Unrolled => {
                self.unroll_extents.pop();
            }
        }

        result
    }

    fn visit_attr(&mut self, key: AttrKey, var: &Var, value: &Arc<Expr>, body: &Stmt) -> Result<()> {
        match key {
            AttrKey::ThreadExtent | AttrKey::VirtualThread => {
                let extent = extent_or_one(value);

                let slot = match key {
                    AttrKey::ThreadExtent => match thread_slot(var.name()) {
                        Some(slot) => slot,
                        None => return Ok(UnknownThreadAxisSnafu { name: var.name() }.fail()?),
                    },
                    _ => ThreadSlot::VThread,
                };

                let before = *self.slot_mut(slot);
                // Thread extents are absolute per axis; virtual threads
                // compound.
                *self.slot_mut(slot) = if key == AttrKey::ThreadExtent { extent } else { before * extent };
                self.is_gpu = true;

                // The thread axis behaves as an enclosing parallel loop for
                // every analysis below this scope.
                let zero = Expr::int(0);
                self.push_frame(var, &zero, extent, FrameKind::SyntheticThread);
                let result = self.walk(body);
                self.pop_frame();

                *self.slot_mut(slot) = before;
                result
            }
            AttrKey::AutoUnrollMaxStep => {
                let saved = self.cur_auto_unroll_max_step;
                self.cur_auto_unroll_max_step = extent_or_one(value);
                let result = self.walk(body);
                self.cur_auto_unroll_max_step = saved;
                result
            }
        }
    }

    fn slot_mut(&mut self, slot: ThreadSlot) -> &mut i64 {
        match slot {
            ThreadSlot::BlockX => &mut self.block_idx_x_len,
            ThreadSlot::BlockY => &mut self.block_idx_y_len,
            ThreadSlot::BlockZ => &mut self.block_idx_z_len,
            ThreadSlot::ThreadX => &mut self.thread_idx_x_len,
            ThreadSlot::ThreadY => &mut self.thread_idx_y_len,
            ThreadSlot::ThreadZ => &mut self.thread_idx_z_len,
            ThreadSlot::VThread => &mut self.vthread_len,
        }
    }

    fn visit_realize(&mut self, buffer: &Buffer, bounds: &[RealizeBound], body: &Stmt) -> Result<()> {
        self.walk(body)?;

        let alloc_elems = bounds.iter().fold(1i64, |acc, b| acc.saturating_mul(extent_or_one(&b.extent)));
        let outer = self.outer_loop_prod as f32;

        let fea = self.features.entry(buffer);
        fea.alloc_size = (alloc_elems.saturating_mul(buffer.elem_bytes())) as f32;
        fea.alloc_prod = alloc_elems as f32 * outer;
        fea.alloc_outer_prod = outer;
        fea.alloc_inner_prod = fea.outer_prod / outer;

        Ok(())
    }

    fn visit_store(&mut self, buffer: &Buffer, store_indices: &[Arc<Expr>], value: &Arc<Expr>) -> Result<()> {
        let mathops = count_math_ops(value, self.effects)?;
        let outer_prod = self.outer_loop_prod as f32;

        // The destination write plus every load in the value expression.
        let mut collector = AccessCollector::default();
        collector.insert_access(buffer, AccessKind::Write, store_indices);
        collector.collect_reads(value);

        // Prime the bound context: every enclosing loop variable starts as
        // the degenerate singleton [min, min+1).
        let mut ana = BoundAnalyzer::new();
        for frame in &self.loop_stack {
            ana.bind(&frame.var, &frame.min, 1);
        }

        // Innermost-first sweep. Each step rebinds one more loop variable
        // to its full extent, so the bound context widens level by level;
        // the regions recorded at a frame describe what its subtree touches
        // per iteration of the loops outside it.
        let mut mem_bytes_list = Vec::with_capacity(self.loop_stack.len());
        let mut compute_ops_list = Vec::with_capacity(self.loop_stack.len());
        let mut cur_compute_ops = mathops.float_total() as i64;
        let mut full_regions: HashMap<u64, Vec<i64>> = HashMap::new();

        for frame in self.loop_stack.iter().rev() {
            ana.bind(&frame.var, &frame.min, frame.extent);

            let table = self.touch_regions.entry(frame.id).or_default();
            let mut mem_bytes: i64 = 0;
            for (buf, acc) in collector.iter() {
                let region = region_extents(&acc.indices, &ana);
                let elems = region_elems(&region);
                table.entry(buf.id()).or_default().push((acc.kind, elems, buf.elem_bytes()));
                mem_bytes = mem_bytes.saturating_add(elems.saturating_mul(buf.elem_bytes()));
                full_regions.insert(buf.id(), region);
            }

            mem_bytes_list.push((mem_bytes as f32).log2());
            cur_compute_ops = cur_compute_ops.saturating_mul(frame.extent);
            compute_ops_list.push((cur_compute_ops as f32).log2());
        }

        let curve = arith_intensity_curve(cur_compute_ops, &compute_ops_list, &mem_bytes_list);

        // Per-buffer access features.
        let mut access_feas = Vec::with_capacity(collector.len());
        for (buf, acc) in collector.iter() {
            let ele_bytes = buf.elem_bytes();
            let bytes = outer_prod * ele_bytes as f32;

            let unique_bytes;
            let lines;
            let unique_lines;
            let stride;
            if self.loop_stack.is_empty() {
                unique_bytes = ele_bytes as f32;
                lines = 1.0;
                unique_lines = 1.0;
                stride = 0;
            } else {
                // Unique bytes: the region recorded at the outermost loop
                // covers the whole nest.
                let outermost = &self.loop_stack[0];
                let entries = self
                    .touch_regions
                    .get(&outermost.id)
                    .and_then(|table| table.get(&buf.id()))
                    .expect("region table missing outermost entry");
                unique_bytes = entries[0].1 as f32 * ele_bytes as f32;

                // Scan inner to outer for the first loop variable with a
                // nonzero stride; loops skipped on the way contribute their
                // extent to the reduction ratio.
                let mut found_stride = 0;
                let mut reduce_ratio: i64 = 1;
                let mut at_innermost = false;
                for (pos, frame) in self.loop_stack.iter().enumerate().rev() {
                    found_stride = access_stride(&acc.indices, buf.shape(), &frame.var);
                    if found_stride != 0 {
                        at_innermost = pos + 1 == self.loop_stack.len();
                        break;
                    }
                    reduce_ratio = reduce_ratio.saturating_mul(frame.extent);
                }

                lines = (outer_prod / reduce_ratio as f32
                    * (found_stride as f32 * ele_bytes as f32 / self.cache_line_size as f32).min(1.0))
                .max(1.0);

                // The reported stride keeps only the innermost-loop case;
                // a stride found further out collapses to 0.
                stride = if at_innermost { found_stride } else { 0 };

                // Longest contiguous run: element bytes times the extent of
                // the last dimension the access covers completely.
                let region = &full_regions[&buf.id()];
                let mut n_continuous = ele_bytes as f32;
                for (dim, extent) in region.iter().enumerate().rev() {
                    if buf.shape().get(dim) == Some(extent) {
                        n_continuous = ele_bytes.saturating_mul(*extent) as f32;
                        break;
                    }
                }
                unique_lines = (unique_bytes / n_continuous.min(self.cache_line_size as f32)).max(1.0);
            }

            let (reuse_kind, reuse_dis_iter, reuse_dis_bytes, reuse_ct) =
                compute_reuse(buf, &acc.indices, &self.loop_stack, &self.touch_regions);

            // Reuse-normalized derivatives; without reuse the sentinel
            // factor 2 keeps them on the same scale.
            let d = |x: f32| if reuse_ct > 0.5 { x / reuse_ct } else { x * 2.0 };

            access_feas.push(BufferAccessFeature {
                buffer_name: buf.name().to_string(),
                acc_kind: acc.kind,
                bytes,
                unique_bytes,
                lines,
                unique_lines,
                reuse_kind,
                reuse_dis_iter,
                reuse_dis_bytes,
                reuse_ct,
                bytes_d_reuse_ct: d(bytes),
                unique_bytes_d_reuse_ct: d(unique_bytes),
                lines_d_reuse_ct: d(lines),
                unique_lines_d_reuse_ct: d(unique_lines),
                stride: stride as f32,
            });
        }

        let (vec_num, vec_prod, vec_len, vec_pos) = annotation_triple(&self.vec_extents);
        let (unroll_num, unroll_prod, unroll_len, unroll_pos) = annotation_triple(&self.unroll_extents);
        let (parallel_num, parallel_prod, parallel_len, parallel_pos) = annotation_triple(&self.parallel_extents);

        let num_loops = self.loop_stack.len() as f32;
        let fea = self.features.entry(buffer);

        fea.float_mad = outer_prod * mathops.float_mad as f32;
        fea.float_addsub = outer_prod * mathops.float_addsub as f32;
        fea.float_mul = outer_prod * mathops.float_mul as f32;
        fea.float_divmod = outer_prod * mathops.float_divmod as f32;
        fea.float_cmp = outer_prod * mathops.float_cmp as f32;
        fea.float_math_func = outer_prod * mathops.float_math_func as f32;
        fea.float_other_func = outer_prod * mathops.float_other_func as f32;
        fea.int_mad = outer_prod * mathops.int_mad as f32;
        fea.int_addsub = outer_prod * mathops.int_addsub as f32;
        fea.int_mul = outer_prod * mathops.int_mul as f32;
        fea.int_divmod = outer_prod * mathops.int_divmod as f32;
        fea.int_cmp = outer_prod * mathops.int_cmp as f32;
        fea.int_math_func = outer_prod * mathops.int_math_func as f32;
        fea.int_other_func = outer_prod * mathops.int_other_func as f32;
        fea.bool_op = outer_prod * mathops.bool_op as f32;
        fea.select_op = outer_prod * mathops.select_op as f32;

        fea.vec_num = vec_num;
        fea.vec_prod = vec_prod;
        fea.vec_len = vec_len;
        fea.vec_pos = vec_pos;
        fea.unroll_num = unroll_num;
        fea.unroll_prod = unroll_prod;
        fea.unroll_len = unroll_len;
        fea.unroll_pos = unroll_pos;
        fea.parallel_num = parallel_num;
        fea.parallel_prod = parallel_prod;
        fea.parallel_len = parallel_len;
        fea.parallel_pos = parallel_pos;

        fea.is_gpu = self.is_gpu;
        fea.block_idx_x_len = self.block_idx_x_len as f32;
        fea.block_idx_y_len = self.block_idx_y_len as f32;
        fea.block_idx_z_len = self.block_idx_z_len as f32;
        fea.thread_idx_x_len = self.thread_idx_x_len as f32;
        fea.thread_idx_y_len = self.thread_idx_y_len as f32;
        fea.thread_idx_z_len = self.thread_idx_z_len as f32;
        fea.vthread_len = self.vthread_len as f32;

        fea.arith_intensity_curve = curve;
        fea.access_feas = access_feas;

        fea.outer_prod = outer_prod;
        fea.num_loops = num_loops;
        fea.auto_unroll_max_step = self.cur_auto_unroll_max_step as f32;

        Ok(())
    }
}

/// `(count, extent product, innermost extent, position)` of one annotation
/// stack.
///
/// Positions stay `Mixed` for any non-empty stack: the finer encoding needs
/// axis information the lowered IR no longer carries, and the schema keys
/// on this behaviour.
fn annotation_triple(extents: &[i64]) -> (f32, f32, f32, AnnotationPos) {
    match extents.last() {
        None => (0.0, 0.0, 0.0, AnnotationPos::None),
        Some(innermost) => {
            let prod = extents.iter().fold(1i64, |acc, extent| acc.saturating_mul(*extent));
            (extents.len() as f32, prod as f32, *innermost as f32, AnnotationPos::Mixed)
        }
    }
}

/// Sample the arithmetic intensity curve at evenly spaced compute-op grid
/// points by piecewise-linear interpolation over the per-depth
/// `(log₂ compute-ops, log₂ bytes)` lists.
fn arith_intensity_curve(
    cur_compute_ops: i64,
    compute_ops_list: &[f32],
    mem_bytes_list: &[f32],
) -> [f32; ARITH_INTENSITY_CURVE_SAMPLE_N] {
    let mut curve = [0.0f32; ARITH_INTENSITY_CURVE_SAMPLE_N];
    if cur_compute_ops <= 0 || compute_ops_list.is_empty() {
        return curve;
    }

    let total = *compute_ops_list.last().expect("non-empty compute ops list");
    let mut pt = 0usize;
    for (i, sample) in curve.iter_mut().enumerate() {
        let x = total * (i + 1) as f32 / ARITH_INTENSITY_CURVE_SAMPLE_N as f32;
        while compute_ops_list[pt] < x - 1e-4 {
            pt += 1;
        }

        *sample = if pt == 0 {
            compute_ops_list[0] / mem_bytes_list[0]
        } else {
            let base = compute_ops_list[pt - 1] / mem_bytes_list[pt - 1];
            let slope = (compute_ops_list[pt] / mem_bytes_list[pt] - base)
                / (compute_ops_list[pt] - compute_ops_list[pt - 1]);
            base + slope * (x - compute_ops_list[pt - 1])
        };
    }

    curve
}

/// Extract one dense feature vector for a lowered program.
///
/// Layout: the number of store records, then one fixed-length segment per
/// record in the order stores were first encountered (see
/// [`crate::emit::feature_names`] for the slot names). If several stores
/// target the same destination buffer, the last one wins.
pub fn per_store_features(stmt: &Stmt, config: &FeatureConfig, effects: &OpEffectTable) -> Result<Vec<f32>> {
    let mut extractor = PerStoreExtractor::new(config.cache_line_size, effects);
    extractor.walk(stmt)?;
    debug_assert_eq!(extractor.outer_loop_prod, 1, "loop stack must unwind completely");

    tracing::debug!(stores = extractor.features.len(), "extracted per-store features");

    let mut out = Vec::with_capacity(1 + extractor.features.len() * emit::feature_vec_len(config.max_n_bufs));
    emit::flatten(&extractor.features, config.max_n_bufs, &mut out);
    Ok(out)
}

/// Extract the raw per-store [`FeatureSet`]s without flattening.
///
/// Mostly useful for inspection and tests; the model consumes the flat
/// vectors from [`per_store_features`].
pub fn per_store_feature_sets(
    stmt: &Stmt,
    config: &FeatureConfig,
    effects: &OpEffectTable,
) -> Result<Vec<(Buffer, FeatureSet)>> {
    let mut extractor = PerStoreExtractor::new(config.cache_line_size, effects);
    extractor.walk(stmt)?;
    debug_assert_eq!(extractor.outer_loop_prod, 1, "loop stack must unwind completely");
    Ok(extractor.features.into_sets())
}
