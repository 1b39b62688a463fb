//! Concatenation of child buckets.

use std::io::IoSlice;

use sluice_bucket::{
    Bucket, BucketError, BucketType, Empty, Eol, EolSet, IovecRead, Result, Scratch, Span,
};
use tracing::{debug, trace};

use crate::check_requested;

/// Reads its children back to back.
///
/// A child is left behind only after it reported EOF. Exhausted children are
/// dropped at the start of the next call, unless the aggregate retains them
/// (see [`AggregateBucket::with_retain`]) so that it can reset.
#[derive(Default)]
pub struct AggregateBucket {
    children: Vec<Box<dyn Bucket>>,
    /// Index of the child being read; children before it are exhausted.
    current: usize,
    retain: bool,
    position: u64,
}

/// A span pulled from the first child with data.
struct Pulled<'a, T> {
    span: Span<'a>,
    extra: T,
    /// Exhausted children passed over before the one that answered.
    skipped: usize,
    /// The answering child is the last one.
    last: bool,
}

/// Applies `op` to each child in turn until one returns something other than
/// an empty EOF span.
///
/// The returned span's EOF flag is kept only when no child follows.
fn pull<'a, T: Default>(
    children: &'a mut [Box<dyn Bucket>],
    mut op: impl FnMut(&'a mut Box<dyn Bucket>) -> Result<(Span<'a>, T)>,
) -> Result<Pulled<'a, T>> {
    let mut rest = children;
    let mut skipped = 0;
    while let Some((child, tail)) = std::mem::take(&mut rest).split_first_mut() {
        let (span, extra) = op(child)?;
        if span.is_empty() && span.is_eof() {
            skipped += 1;
            rest = tail;
            continue;
        }
        let last = tail.is_empty();
        let span = if last {
            span
        } else {
            Span::new(span.into_bytes())
        };
        return Ok(Pulled {
            span,
            extra,
            skipped,
            last,
        });
    }
    Ok(Pulled {
        span: Span::EOF,
        extra: T::default(),
        skipped,
        last: true,
    })
}

impl AggregateBucket {
    /// Type tag of [`AggregateBucket`].
    pub const TYPE: BucketType = BucketType::new("aggregate");

    /// Creates an empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an aggregate over `children`.
    pub fn from_children(children: Vec<Box<dyn Bucket>>) -> Self {
        let mut agg = Self::new();
        for child in children {
            agg.append_boxed(child);
        }
        agg
    }

    /// Keeps exhausted children so the aggregate can be reset.
    pub fn with_retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }

    /// Adds `bucket` after the existing children.
    pub fn append(&mut self, bucket: impl Bucket + 'static) -> &mut Self {
        self.append_boxed(Box::new(bucket))
    }

    /// Adds an already boxed bucket after the existing children.
    pub fn append_boxed(&mut self, bucket: Box<dyn Bucket>) -> &mut Self {
        if !is_empty_kind(bucket.as_ref()) {
            self.children.push(bucket);
        }
        self
    }

    /// Adds `bucket` in front of the unread children.
    pub fn prepend(&mut self, bucket: impl Bucket + 'static) -> &mut Self {
        self.prepend_boxed(Box::new(bucket))
    }

    /// Adds an already boxed bucket in front of the unread children.
    pub fn prepend_boxed(&mut self, bucket: Box<dyn Bucket>) -> &mut Self {
        if !is_empty_kind(bucket.as_ref()) {
            self.children.insert(self.current, bucket);
        }
        self
    }

    /// Returns the number of children not yet known to be exhausted.
    pub fn pending(&self) -> usize {
        self.children.len() - self.current
    }

    /// Drops children that reported EOF during earlier calls.
    fn release_finished(&mut self) {
        if self.retain || self.current == 0 {
            return;
        }
        trace!(count = self.current, "aggregate drops finished children");
        self.children.drain(..self.current);
        self.current = 0;
    }
}

fn is_empty_kind(bucket: &dyn Bucket) -> bool {
    bucket.bucket_type() == Some(&Empty::TYPE)
}

impl Bucket for AggregateBucket {
    fn read(&mut self, requested: usize, scratch: &Scratch) -> Result<Span<'_>> {
        check_requested(requested)?;
        self.release_finished();
        let AggregateBucket {
            children,
            current,
            position,
            ..
        } = self;
        let pulled = pull(&mut children[*current..], |child| {
            Ok((child.read(requested, scratch)?, ()))
        })?;
        *current += pulled.skipped;
        *position += pulled.span.len() as u64;
        Ok(pulled.span)
    }

    fn read_until_newline(
        &mut self,
        acceptable: EolSet,
        requested: usize,
        scratch: &Scratch,
    ) -> Result<(Span<'_>, Eol)> {
        check_requested(requested)?;
        self.release_finished();
        let AggregateBucket {
            children,
            current,
            position,
            ..
        } = self;
        let pulled = pull(&mut children[*current..], |child| {
            child.read_until_newline(acceptable, requested, scratch)
        })?;
        *current += pulled.skipped;
        *position += pulled.span.len() as u64;

        let mut eol = pulled.extra;
        // A child ended on \r; the \n may start the next child.
        if !pulled.last
            && acceptable.contains(EolSet::CRLF)
            && !pulled.span.is_eof()
            && pulled.span.as_bytes().last() == Some(&b'\r')
            && matches!(eol, Eol::Cr | Eol::None)
            && pulled.span.len() < requested
        {
            eol = Eol::CrLfSplit;
        }
        Ok((pulled.span, eol))
    }

    fn read_iovec<'a>(
        &'a mut self,
        requested: usize,
        vecs: &mut [IoSlice<'a>],
        scratch: &Scratch,
    ) -> Result<IovecRead> {
        check_requested(requested)?;
        if vecs.is_empty() {
            return Err(BucketError::invalid_argument(
                "read_iovec needs at least one slot",
            ));
        }
        self.release_finished();
        let AggregateBucket {
            children,
            current,
            position,
            ..
        } = self;
        let total = children.len();
        let mut out = IovecRead::default();
        let mut left = requested;
        let mut finished = 0;
        for child in children[*current..].iter_mut() {
            if out.used == vecs.len() || left == 0 {
                break;
            }
            // A peek flagged EOF shows everything the child has left.
            let whole = match child.peek(true, scratch) {
                Ok(peeked) if peeked.is_eof() => Some(peeked.len()),
                _ => None,
            };
            if whole == Some(0) {
                finished += 1;
                continue;
            }
            let got = match child.read_iovec(left, &mut vecs[out.used..], scratch) {
                Ok(got) => got,
                // Hand out what was gathered; the child is asked again next call.
                Err(e) if e.is_would_block() && out.used > 0 => break,
                Err(e) => return Err(e),
            };
            if got.eof {
                finished += 1;
                continue;
            }
            out.used += got.used;
            out.len += got.len;
            left -= got.len;
            if whole != Some(got.len) {
                break;
            }
            finished += 1;
        }
        *current += finished;
        *position += out.len as u64;
        out.eof = out.len == 0 && *current >= total;
        Ok(out)
    }

    fn peek(&mut self, no_poll: bool, scratch: &Scratch) -> Result<Span<'_>> {
        self.release_finished();
        let AggregateBucket {
            children, current, ..
        } = self;
        let pulled = pull(&mut children[*current..], |child| {
            Ok((child.peek(no_poll, scratch)?, ()))
        })?;
        *current += pulled.skipped;
        Ok(pulled.span)
    }

    fn read_skip(&mut self, requested: usize, scratch: &Scratch) -> Result<usize> {
        check_requested(requested)?;
        self.release_finished();
        while let Some(child) = self.children.get_mut(self.current) {
            let n = child.read_skip(requested, scratch)?;
            if n > 0 {
                self.position += n as u64;
                return Ok(n);
            }
            self.current += 1;
        }
        Ok(0)
    }

    fn read_remaining_bytes(&mut self, scratch: &Scratch) -> Result<u64> {
        let mut total = 0u64;
        for child in &mut self.children[self.current..] {
            total += child.read_remaining_bytes(scratch)?;
        }
        Ok(total)
    }

    fn reset(&mut self, scratch: &Scratch) -> Result<()> {
        if !self.can_reset() {
            return Err(BucketError::not_implemented(self.name(), "reset"));
        }
        for child in &mut self.children {
            child.reset(scratch)?;
        }
        debug!(children = self.children.len(), "aggregate reset");
        self.current = 0;
        self.position = 0;
        Ok(())
    }

    fn can_reset(&self) -> bool {
        self.retain && self.children.iter().all(|c| c.can_reset())
    }

    fn duplicate(&self, scratch: &Scratch) -> Result<Box<dyn Bucket>> {
        let children = self.children[self.current..]
            .iter()
            .map(|c| c.duplicate(scratch))
            .collect::<Result<Vec<_>>>()?;
        Ok(Box::new(AggregateBucket {
            children,
            current: 0,
            retain: self.retain,
            position: self.position,
        }))
    }

    fn read_bucket(
        &mut self,
        bucket_type: &BucketType,
        scratch: &Scratch,
    ) -> Result<Option<Box<dyn Bucket>>> {
        self.release_finished();
        let Some(head) = self.children.get_mut(self.current) else {
            return Ok(None);
        };
        if head.bucket_type() == Some(bucket_type) {
            let child = self.children.remove(self.current);
            debug!(kind = %bucket_type, "aggregate hands off head child");
            return Ok(Some(child));
        }
        // Nested aggregates and wrappers get a chance to hand out their head.
        head.read_bucket(bucket_type, scratch)
    }

    fn bucket_type(&self) -> Option<&'static BucketType> {
        Some(&Self::TYPE)
    }

    fn position(&self) -> Option<u64> {
        Some(self.position)
    }
}

impl std::fmt::Debug for AggregateBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.children.iter().map(|c| c.name()).collect();
        f.debug_struct("AggregateBucket")
            .field("children", &names)
            .field("current", &self.current)
            .field("retain", &self.retain)
            .field("position", &self.position)
            .finish()
    }
}
