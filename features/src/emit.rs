//! Flattening feature sets into dense vectors, and the parallel name
//! vector that documents every slot.
//!
//! The field order here is the wire schema of the cost model: it never
//! changes between releases, and the name emitter must stay in lockstep
//! with the vector emitter (the tests hold the two against each other).

use strum::EnumCount;

use crate::config::ARITH_INTENSITY_CURVE_SAMPLE_N;
use crate::extract::FeatureMap;
use crate::types::{AnnotationPos, BufferAccessFeature};

/// Signed shifted log: `sign(x) * log2(|x| + 1)`, with `slog(0) = 0`.
///
/// Compresses the wildly varying magnitudes (byte counts, loop products)
/// into a range the model trains on, while staying monotone and odd.
pub fn slog(x: f32) -> f32 {
    if x < 0.0 {
        -(-x + 1.0).log2()
    } else {
        (x + 1.0).log2()
    }
}

/// Number of one-hot slots for the access kind (`Unknown` is never
/// emitted; an unknown access encodes as all zeros).
const ACCESS_KIND_ONE_HOT: usize = 3;

/// Number of one-hot slots for the reuse kind.
const REUSE_KIND_ONE_HOT: usize = 3;

/// Scalar fields in the per-buffer section besides the two one-hots:
/// bytes, unique_bytes, lines, unique_lines, reuse_dis_iter,
/// reuse_dis_bytes, reuse_ct, four `_d_reuse_ct` derivatives, stride.
const ACCESS_SCALARS: usize = 12;

/// Per-store header: 16 compute fields, three annotation triples with an
/// 8-wide one-hot each, `is_gpu`, 7 GPU lengths, and the intensity curve.
const HEADER_LEN: usize = 16 + 3 * (3 + AnnotationPos::COUNT) + 1 + 7 + ARITH_INTENSITY_CURVE_SAMPLE_N;

/// Slots per buffer in the access section.
const PER_BUF_LEN: usize = ACCESS_KIND_ONE_HOT + REUSE_KIND_ONE_HOT + ACCESS_SCALARS;

/// Allocation plus overall trailer.
const TRAILER_LEN: usize = 4 + 3;

/// Length of one store's segment for a given buffer slot count.
pub const fn feature_vec_len(max_n_bufs: usize) -> usize {
    HEADER_LEN + max_n_bufs * PER_BUF_LEN + TRAILER_LEN
}

fn push_one_hot(out: &mut Vec<f32>, width: usize, selected: usize) {
    for i in 0..width {
        out.push(if i == selected { 1.0 } else { 0.0 });
    }
}

/// Flatten every store's features into `out`, preceded by the store count.
pub(crate) fn flatten(features: &FeatureMap, max_n_bufs: usize, out: &mut Vec<f32>) {
    out.push(features.len() as f32);

    for (_, fea) in features.iter() {
        let start = out.len();

        // Compute section.
        out.push(slog(fea.float_mad));
        out.push(slog(fea.float_addsub));
        out.push(slog(fea.float_mul));
        out.push(slog(fea.float_divmod));
        out.push(slog(fea.float_cmp));
        out.push(slog(fea.float_math_func));
        out.push(slog(fea.float_other_func));
        out.push(slog(fea.int_mad));
        out.push(slog(fea.int_addsub));
        out.push(slog(fea.int_mul));
        out.push(slog(fea.int_divmod));
        out.push(slog(fea.int_cmp));
        out.push(slog(fea.int_math_func));
        out.push(slog(fea.int_other_func));
        out.push(slog(fea.bool_op));
        out.push(slog(fea.select_op));

        // Annotation section.
        out.push(slog(fea.vec_num));
        out.push(slog(fea.vec_prod));
        out.push(slog(fea.vec_len));
        push_one_hot(out, AnnotationPos::COUNT, fea.vec_pos as usize);
        out.push(slog(fea.unroll_num));
        out.push(slog(fea.unroll_prod));
        out.push(slog(fea.unroll_len));
        push_one_hot(out, AnnotationPos::COUNT, fea.unroll_pos as usize);
        out.push(slog(fea.parallel_num));
        out.push(slog(fea.parallel_prod));
        out.push(slog(fea.parallel_len));
        push_one_hot(out, AnnotationPos::COUNT, fea.parallel_pos as usize);

        // GPU section; the flag is raw, the lengths are slogged.
        out.push(if fea.is_gpu { 1.0 } else { 0.0 });
        out.push(slog(fea.block_idx_x_len));
        out.push(slog(fea.block_idx_y_len));
        out.push(slog(fea.block_idx_z_len));
        out.push(slog(fea.thread_idx_x_len));
        out.push(slog(fea.thread_idx_y_len));
        out.push(slog(fea.thread_idx_z_len));
        out.push(slog(fea.vthread_len));

        // Intensity curve samples are already ratios; no transform.
        out.extend_from_slice(&fea.arith_intensity_curve);

        // Access section: order buffers by (lines desc, bytes desc), keep
        // the first max_n_bufs, zero-pad the rest.
        let mut order: Vec<usize> = (0..fea.access_feas.len()).collect();
        order.sort_by(|&l, &r| {
            let key = |i: usize| (fea.access_feas[i].lines, fea.access_feas[i].bytes);
            key(r).partial_cmp(&key(l)).unwrap_or(std::cmp::Ordering::Equal)
        });
        order.truncate(max_n_bufs);

        for &idx in &order {
            push_access_feature(out, &fea.access_feas[idx]);
        }
        for _ in order.len()..max_n_bufs {
            out.extend(std::iter::repeat(0.0).take(PER_BUF_LEN));
        }

        // Allocation section.
        out.push(slog(fea.alloc_size));
        out.push(slog(fea.alloc_prod));
        out.push(slog(fea.alloc_outer_prod));
        out.push(slog(fea.alloc_inner_prod));

        // Overall section.
        out.push(slog(fea.outer_prod));
        out.push(slog(fea.num_loops));
        out.push(slog(fea.auto_unroll_max_step));

        debug_assert_eq!(out.len() - start, feature_vec_len(max_n_bufs));
    }
}

fn push_access_feature(out: &mut Vec<f32>, acc: &BufferAccessFeature) {
    push_one_hot(out, ACCESS_KIND_ONE_HOT, acc.acc_kind as usize);
    out.push(slog(acc.bytes));
    out.push(slog(acc.unique_bytes));
    out.push(slog(acc.lines));
    out.push(slog(acc.unique_lines));
    push_one_hot(out, REUSE_KIND_ONE_HOT, acc.reuse_kind as usize);
    out.push(slog(acc.reuse_dis_iter));
    out.push(slog(acc.reuse_dis_bytes));
    out.push(slog(acc.reuse_ct));
    out.push(slog(acc.bytes_d_reuse_ct));
    out.push(slog(acc.unique_bytes_d_reuse_ct));
    out.push(slog(acc.lines_d_reuse_ct));
    out.push(slog(acc.unique_lines_d_reuse_ct));
    out.push(slog(acc.stride));
}

/// Names of every slot in one store's segment, in emission order.
///
/// The spelling is part of the schema (training pipelines select columns
/// by these strings); it is stable across releases.
pub fn feature_names(max_n_bufs: usize) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(feature_vec_len(max_n_bufs));
    let mut push = |name: &str| names.push(name.to_string());

    push("float_mad");
    push("float_addsub");
    push("float_mul");
    push("float_divmod");
    push("float_cmp");
    push("float_mathfunc");
    push("float_otherfunc");
    push("int_mad");
    push("int_addsub");
    push("int_mul");
    push("int_divmod");
    push("int_cmp");
    push("int_mathfunc");
    push("int_otherfunc");
    push("bool_op");
    push("select_op");

    const POS_TAGS: [&str; AnnotationPos::COUNT] = [
        "kPosNone",
        "kPosInnerSpatial",
        "kPosMiddleSpatial",
        "kPosOuterSpatial",
        "kPosInnerReduce",
        "kPosMiddleReduce",
        "kPosOuterReduce",
        "kPosMixed",
    ];
    for section in ["vec", "unroll", "parallel"] {
        names.push(format!("{section}_num"));
        names.push(format!("{section}_prod"));
        names.push(format!("{section}_len"));
        for tag in POS_TAGS {
            names.push(format!("{section}_type.{tag}"));
        }
    }

    names.push("is_gpu".to_string());
    names.push("blockIdx_x_len".to_string());
    names.push("blockIdx_y_len".to_string());
    names.push("blockIdx_z_len".to_string());
    names.push("threadIdx_x_len".to_string());
    names.push("threadIdx_y_len".to_string());
    names.push("threadIdx_z_len".to_string());
    names.push("vthread_len".to_string());

    for i in 0..ARITH_INTENSITY_CURVE_SAMPLE_N {
        names.push(format!("arith_intensity_curve_{i}"));
    }

    for b in 0..max_n_bufs {
        let prefix = format!("B{b}.");
        names.push(format!("{prefix}acc_type.kRead"));
        names.push(format!("{prefix}acc_type.kWrite"));
        names.push(format!("{prefix}acc_type.kReadWrite"));
        names.push(format!("{prefix}bytes"));
        names.push(format!("{prefix}unique_bytes"));
        names.push(format!("{prefix}lines"));
        names.push(format!("{prefix}unique_lines"));
        names.push(format!("{prefix}reuse_type.kLoopMultipleRead"));
        names.push(format!("{prefix}reuse_type.kSerialMultipleReadWrite"));
        names.push(format!("{prefix}reuse_type.kNoReuse"));
        names.push(format!("{prefix}reuse_dis_iter"));
        names.push(format!("{prefix}reuse_dis_bytes"));
        names.push(format!("{prefix}reuse_ct"));
        names.push(format!("{prefix}bytes_d_reuse_ct"));
        names.push(format!("{prefix}unique_bytes_d_reuse_ct"));
        names.push(format!("{prefix}lines_d_reuse_ct"));
        names.push(format!("{prefix}unique_lines_d_reuse_ct"));
        names.push(format!("{prefix}stride"));
    }

    names.push("alloc_size".to_string());
    names.push("alloc_prod".to_string());
    names.push("alloc_outer_prod".to_string());
    names.push("alloc_inner_prod".to_string());

    names.push("outer_prod".to_string());
    names.push("num_loops".to_string());
    names.push("auto_unroll_max_step".to_string());

    names
}
