//! Vector/name emitter agreement tests.

use test_case::test_case;

use crate::emit::{feature_names, feature_vec_len, slog};

#[test_case(0)]
#[test_case(1)]
#[test_case(3)]
#[test_case(5)]
fn test_names_match_vector_length(max_n_bufs: usize) {
    assert_eq!(feature_names(max_n_bufs).len(), feature_vec_len(max_n_bufs));
}

#[test]
fn test_segment_length_closed_form() {
    // 67-slot header, 18 slots per buffer, 7-slot trailer.
    assert_eq!(feature_vec_len(0), 74);
    assert_eq!(feature_vec_len(5), 67 + 5 * 18 + 7);
}

#[test]
fn test_name_order_is_stable() {
    let names = feature_names(2);

    assert_eq!(names[0], "float_mad");
    assert_eq!(names[15], "select_op");
    assert_eq!(names[16], "vec_num");
    assert_eq!(names[19], "vec_type.kPosNone");
    assert_eq!(names[26], "vec_type.kPosMixed");
    assert_eq!(names[49], "is_gpu");
    assert_eq!(names[57], "arith_intensity_curve_0");
    assert_eq!(names[66], "arith_intensity_curve_9");
    assert_eq!(names[67], "B0.acc_type.kRead");
    assert_eq!(names[67 + 18], "B1.acc_type.kRead");
    assert_eq!(names[names.len() - 7], "alloc_size");
    assert_eq!(names[names.len() - 3], "outer_prod");
    assert_eq!(names[names.len() - 1], "auto_unroll_max_step");
}

#[test]
fn test_per_buffer_sections_have_18_slots() {
    let names = feature_names(4);
    for b in 0..4 {
        let prefix = format!("B{b}.");
        assert_eq!(names.iter().filter(|n| n.starts_with(&prefix)).count(), 18);
    }
}

#[test]
fn test_slog_known_values() {
    assert_eq!(slog(0.0), 0.0);
    assert_eq!(slog(1.0), 1.0);
    assert_eq!(slog(3.0), 2.0);
    assert_eq!(slog(-3.0), -2.0);
    assert_eq!(slog(1023.0), 10.0);
}
