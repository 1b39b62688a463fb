//! Concrete bucket kinds.
//!
//! - [`MemoryBucket`]: bytes held in memory.
//! - [`FileBucket`]: a file read through positional reads.
//! - [`AggregateBucket`]: a sequence of child buckets read back to back.
//! - [`TakeBucket`]: a prefix of another bucket.
//! - [`PipeBucket`]: data pushed by a [`PipeWriter`], possibly from another
//!   thread. Reports `WouldBlock` while empty.
//! - [`Base64DecodeBucket`]: decodes base64 read from another bucket.
//! - [`StreamBucket`]: any [`std::io::Read`] source, such as stdin.
//!
//! ```
//! use sluice_bucket::{BucketExt, Scratch};
//! use sluice_buckets::{AggregateBucket, MemoryBucket, TakeBucket};
//!
//! let scratch = Scratch::new();
//! let mut agg = AggregateBucket::new();
//! agg.append(MemoryBucket::from_static(b"hello "));
//! agg.append(MemoryBucket::from_static(b"world"));
//!
//! let mut head = TakeBucket::new(agg, 8);
//! assert_eq!(head.read_to_vec(&scratch).unwrap(), b"hello wo");
//! ```

mod aggregate;
mod base64_decode;
mod file;
mod memory;
mod pipe;
mod stream;
mod take;

pub use aggregate::AggregateBucket;
pub use base64_decode::Base64DecodeBucket;
pub use file::FileBucket;
pub use memory::MemoryBucket;
pub use pipe::{PipeBucket, PipeWriter, pipe};
pub use stream::StreamBucket;
pub use take::TakeBucket;

use sluice_bucket::{BucketError, Result};

fn check_requested(requested: usize) -> Result<()> {
    if requested == 0 {
        return Err(BucketError::invalid_argument("requested must be > 0"));
    }
    Ok(())
}
