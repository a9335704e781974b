use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The lowered IR violated an input contract (unknown thread axis,
    /// unclassified call operator).
    #[snafu(context(false))]
    #[snafu(display("malformed lowered IR: {source}"))]
    MalformedIr { source: skein_ir::Error },
}
