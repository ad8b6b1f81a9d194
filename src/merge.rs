use crate::call::Call;
use crate::error::{Error, Result};
use itertools::{EitherOrBoth, Itertools};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;
use std::iter;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// Names accepted by [`Merger::parse`], in the form shown to users.
pub const MERGER_NAMES: [&str; 6] = [
    "alternate",
    "concatenate",
    "randomMix",
    "random",
    "probabilistic(size, p)",
    "interleaveChunks(chunkSize)",
];

/// Strategy for combining two word sequences into one.
#[derive(Debug, Clone, PartialEq)]
pub enum Merger {
    /// Interleave by index, then append the tail of the longer sequence.
    Alternate,
    /// `s1` followed by `s2`.
    Concatenate,
    /// Shuffle of `s1 ++ s2`.
    RandomMix,
    /// `s1` with every element of `s2` inserted at a random position.
    Random,
    /// Draw a fixed number of elements from both pools, biased towards `s1`.
    Probabilistic(ProbabilisticMerge),
    /// Alternate fixed-size chunks of both sequences.
    InterleaveChunks(NonZeroUsize),
}

/// Parameters of [`Merger::Probabilistic`]; only constructible when valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilisticMerge {
    size: usize,
    probability: f64,
}

impl ProbabilisticMerge {
    pub fn new(size: usize, probability: f64) -> Result<Self> {
        if size == 0 {
            return Err(Error::configuration(
                "probabilistic merge size must be greater than zero",
            ));
        }
        if !(0.0..=1.0).contains(&probability) {
            return Err(Error::configuration(format!(
                "probabilistic merge probability must be within [0, 1], got {probability}"
            )));
        }
        Ok(Self { size, probability })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl Merger {
    pub fn probabilistic(size: usize, probability: f64) -> Result<Self> {
        ProbabilisticMerge::new(size, probability).map(Self::Probabilistic)
    }

    pub fn interleave_chunks(chunk_size: usize) -> Result<Self> {
        NonZeroUsize::new(chunk_size)
            .map(Self::InterleaveChunks)
            .ok_or_else(|| Error::configuration("chunk size must be greater than zero"))
    }

    /// Resolve a merger from its name, e.g. `alternate` or `probabilistic(100, 0.5)`.
    pub fn parse(input: &str) -> Result<Self> {
        let call = Call::parse(input)?;
        match call.name.as_str() {
            "alternate" => call.expect_args(0).map(|_| Self::Alternate),
            "concatenate" => call.expect_args(0).map(|_| Self::Concatenate),
            "randomMix" => call.expect_args(0).map(|_| Self::RandomMix),
            "random" => call.expect_args(0).map(|_| Self::Random),
            "probabilistic" => {
                call.expect_args(2)?;
                Self::probabilistic(call.count_arg(0)?, call.arg(1)?)
            }
            "interleaveChunks" => {
                call.expect_args(1)?;
                Self::interleave_chunks(call.count_arg(0)?)
            }
            _ => Err(Error::UnknownMerger {
                name: call.name,
                valid: MERGER_NAMES.iter().map(|n| n.to_string()).collect(),
            }),
        }
    }

    /// Combine two sequences. Only [`Merger::Probabilistic`] can fail.
    ///
    /// Every other strategy returns the non-empty side unchanged when one
    /// input is empty.
    pub fn merge<T, R>(&self, s1: Vec<T>, s2: Vec<T>, rng: &mut R) -> Result<Vec<T>>
    where
        T: Clone,
        R: Rng + ?Sized,
    {
        if !matches!(self, Self::Probabilistic(_)) {
            if s1.is_empty() {
                return Ok(s2);
            }
            if s2.is_empty() {
                return Ok(s1);
            }
        }

        let merged = match self {
            Self::Alternate => alternate(s1, s2),
            Self::Concatenate => concatenate(s1, s2),
            Self::RandomMix => random_mix(s1, s2, rng),
            Self::Random => random_insert(s1, s2, rng),
            Self::Probabilistic(params) => return probabilistic(s1, s2, *params, rng),
            Self::InterleaveChunks(chunk_size) => interleave_chunks(s1, s2, chunk_size.get()),
        };
        Ok(merged)
    }
}

impl fmt::Display for Merger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alternate => write!(f, "alternate"),
            Self::Concatenate => write!(f, "concatenate"),
            Self::RandomMix => write!(f, "randomMix"),
            Self::Random => write!(f, "random"),
            Self::Probabilistic(p) => write!(f, "probabilistic({}, {})", p.size, p.probability),
            Self::InterleaveChunks(n) => write!(f, "interleaveChunks({n})"),
        }
    }
}

impl FromStr for Merger {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

pub fn alternate<T>(s1: Vec<T>, s2: Vec<T>) -> Vec<T> {
    s1.into_iter().interleave(s2).collect()
}

pub fn concatenate<T>(mut s1: Vec<T>, s2: Vec<T>) -> Vec<T> {
    s1.extend(s2);
    s1
}

pub fn random_mix<T, R: Rng + ?Sized>(s1: Vec<T>, s2: Vec<T>, rng: &mut R) -> Vec<T> {
    let mut mixed = concatenate(s1, s2);
    mixed.shuffle(rng);
    mixed
}

/// Same distribution as inserting each element of `s2` at a uniformly random
/// position of the growing `s1`, built in one pass.
pub fn random_insert<T, R: Rng + ?Sized>(s1: Vec<T>, mut s2: Vec<T>, rng: &mut R) -> Vec<T> {
    s2.shuffle(rng);
    let mut from_second: Vec<bool> = iter::repeat(false)
        .take(s1.len())
        .chain(iter::repeat(true).take(s2.len()))
        .collect();
    from_second.shuffle(rng);

    let mut first = s1.into_iter();
    let mut second = s2.into_iter();
    from_second
        .into_iter()
        .filter_map(|take_second| {
            if take_second {
                second.next()
            } else {
                first.next()
            }
        })
        .collect()
}

pub fn probabilistic<T, R: Rng + ?Sized>(
    mut s1: Vec<T>,
    mut s2: Vec<T>,
    params: ProbabilisticMerge,
    rng: &mut R,
) -> Result<Vec<T>> {
    s1.shuffle(rng);
    s2.shuffle(rng);
    let mut first = s1.into_iter();
    let mut second = s2.into_iter();

    let mut merged = Vec::with_capacity(params.size);
    while merged.len() < params.size {
        let next = if rng.gen_bool(params.probability) {
            first.next().or_else(|| second.next())
        } else {
            second.next().or_else(|| first.next())
        };

        match next {
            Some(item) => merged.push(item),
            None => {
                return Err(Error::Exhaustion {
                    requested: params.size,
                    produced: merged.len(),
                })
            }
        }
    }
    Ok(merged)
}

pub fn interleave_chunks<T: Clone>(s1: Vec<T>, s2: Vec<T>, chunk_size: usize) -> Vec<T> {
    let total = s1.len() + s2.len();
    let mut merged = Vec::with_capacity(total);
    for pair in s1.chunks(chunk_size).zip_longest(s2.chunks(chunk_size)) {
        match pair {
            EitherOrBoth::Both(a, b) => {
                merged.extend_from_slice(a);
                merged.extend_from_slice(b);
            }
            EitherOrBoth::Left(chunk) | EitherOrBoth::Right(chunk) => {
                merged.extend_from_slice(chunk)
            }
        }
    }
    merged
}
