use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// A `thread_extent` scope names an axis the target model doesn't have.
    #[snafu(display("unknown thread axis {name:?} in thread_extent scope"))]
    UnknownThreadAxis { name: String },

    /// A call operator has no entry in the op-effect table.
    #[snafu(display("call operator {op:?} has no effect classification"))]
    UnknownCallEffect { op: String },
}
