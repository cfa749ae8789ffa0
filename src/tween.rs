//! Frame-stepped scalar tweens.
//!
//! An [`Animation`] describes how a value moves over time: timed segments,
//! sequences, repeats, and delays, composable like the animation builders of
//! UI toolkits. A [`Tween`] is one running instance of it, advanced by
//! whatever drives frames.
//!
//! ```ignore
//! let blast_then_fall = Animation::sequence(vec![
//!     Animation::timing(1.0, blast, Easing::EaseInOutQuad).with_tag(BLAST_DONE),
//!     Animation::timing(2.0, fall, Easing::EaseInOutQuad).with_tag(FALL_DONE),
//! ]);
//! let mut tween = Tween::new(0.0, Animation::delay(start_delay, blast_then_fall));
//!
//! // Every frame:
//! let step = tween.advance(dt);
//! progress.store(epoch, step.value);
//! ```
//!
//! Cancelling is dropping (or replacing) the tween. The value it reached is
//! whatever the last [`TweenStep`] reported.

use crate::easing::Easing;
use std::time::Duration;

/// Declarative description of a scalar animation.
#[derive(Debug, Clone, PartialEq)]
pub enum Animation {
    /// Move to `to` over `duration`.
    Timing {
        to: f32,
        duration: Duration,
        easing: Easing,
        /// Reported in [`TweenStep::completed`] when this segment ends.
        tag: Option<u32>,
    },
    /// Play children one after another.
    Sequence(Vec<Animation>),
    /// Play `animation` `times` times, forever when `None`. With `reverse`,
    /// every other pass plays backwards.
    Repeat {
        animation: Box<Animation>,
        times: Option<u32>,
        reverse: bool,
    },
    /// Hold the current value for `delay`, then play `animation`.
    Delay {
        delay: Duration,
        animation: Box<Animation>,
    },
}

impl Animation {
    pub fn timing(to: f32, duration: Duration, easing: Easing) -> Self {
        Animation::Timing {
            to,
            duration,
            easing,
            tag: None,
        }
    }

    pub fn sequence(animations: Vec<Animation>) -> Self {
        Animation::Sequence(animations)
    }

    pub fn repeat(animation: Animation, times: Option<u32>, reverse: bool) -> Self {
        Animation::Repeat {
            animation: Box::new(animation),
            times,
            reverse,
        }
    }

    pub fn delay(delay: Duration, animation: Animation) -> Self {
        Animation::Delay {
            delay,
            animation: Box::new(animation),
        }
    }

    /// Tag a timing segment. Has no effect on other variants.
    pub fn with_tag(mut self, new_tag: u32) -> Self {
        if let Animation::Timing { tag, .. } = &mut self {
            *tag = Some(new_tag);
        }
        self
    }

    /// Total play time, `None` for an infinite repeat.
    pub fn total_duration(&self) -> Option<Duration> {
        match self {
            Animation::Timing { duration, .. } => Some(*duration),
            Animation::Sequence(children) => children
                .iter()
                .try_fold(Duration::ZERO, |acc, child| Some(acc + child.total_duration()?)),
            Animation::Repeat { animation, times, .. } => {
                let once = animation.total_duration()?;
                times.map(|n| once * n)
            }
            Animation::Delay { delay, animation } => Some(*delay + animation.total_duration()?),
        }
    }
}

/// One flattened segment.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Step {
    from: f32,
    to: f32,
    duration: f32,
    easing: Easing,
    tag: Option<u32>,
}

impl Step {
    fn sample(&self, elapsed: f32) -> f32 {
        if self.duration <= 0.0 {
            return self.to;
        }
        self.from + (self.to - self.from) * self.easing.apply(elapsed / self.duration)
    }

    fn reversed(&self) -> Step {
        Step {
            from: self.to,
            to: self.from,
            ..*self
        }
    }
}

/// Append `animation`'s segments starting at `start`, returning the end value.
fn flatten(animation: &Animation, start: f32, steps: &mut Vec<Step>) -> f32 {
    match animation {
        Animation::Timing {
            to,
            duration,
            easing,
            tag,
        } => {
            steps.push(Step {
                from: start,
                to: *to,
                duration: duration.as_secs_f32(),
                easing: *easing,
                tag: *tag,
            });
            *to
        }
        Animation::Sequence(children) => children
            .iter()
            .fold(start, |value, child| flatten(child, value, steps)),
        Animation::Delay { delay, animation } => {
            steps.push(Step {
                from: start,
                to: start,
                duration: delay.as_secs_f32(),
                easing: Easing::Linear,
                tag: None,
            });
            flatten(animation, start, steps)
        }
        Animation::Repeat {
            animation,
            times,
            reverse,
        } => {
            let times = times.unwrap_or_else(|| {
                log::warn!("nested infinite repeat plays once");
                1
            });
            let mut pass = Vec::new();
            let end = flatten(animation, start, &mut pass);
            let mut value = start;
            for i in 0..times {
                if *reverse && i % 2 == 1 {
                    steps.extend(pass.iter().rev().map(Step::reversed));
                    value = start;
                } else {
                    steps.extend_from_slice(&pass);
                    value = end;
                }
            }
            value
        }
    }
}

/// Result of advancing a [`Tween`].
#[derive(Debug, Clone, PartialEq)]
pub struct TweenStep {
    pub value: f32,
    /// Tags of segments that ended during this advance, in order.
    pub completed: Vec<u32>,
    /// Set once the whole animation has played. Never set for infinite repeats.
    pub finished: bool,
    /// Part of `dt` left over after the animation finished.
    pub leftover: Duration,
}

/// Running instance of an [`Animation`].
#[derive(Debug, Clone)]
pub struct Tween {
    steps: Vec<Step>,
    index: usize,
    elapsed: f32,
    value: f32,
    looping: bool,
}

impl Tween {
    /// Start `animation` from `from`.
    ///
    /// Only a top-level `Repeat { times: None, .. }` loops forever; nested
    /// infinite repeats play once.
    pub fn new(from: f32, animation: Animation) -> Self {
        let mut steps = Vec::new();
        let looping = match &animation {
            Animation::Repeat {
                animation,
                times: None,
                reverse,
            } => {
                // Each pass restarts at `from`; reversing appends the way back.
                flatten(animation, from, &mut steps);
                if *reverse {
                    let back: Vec<Step> = steps.iter().rev().map(Step::reversed).collect();
                    steps.extend(back);
                }
                steps.iter().any(|step| step.duration > 0.0)
            }
            other => {
                flatten(other, from, &mut steps);
                false
            }
        };

        Self {
            steps,
            index: 0,
            elapsed: 0.0,
            value: from,
            looping,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_finished(&self) -> bool {
        !self.looping && self.index >= self.steps.len()
    }

    /// Advance by `dt` and report the new value.
    pub fn advance(&mut self, dt: Duration) -> TweenStep {
        let mut remaining = dt.as_secs_f32();
        let mut completed = Vec::new();

        loop {
            if self.index >= self.steps.len() {
                if self.looping {
                    self.index = 0;
                    continue;
                }
                break;
            }

            let step = self.steps[self.index];
            let left = (step.duration - self.elapsed).max(0.0);
            if remaining < left {
                self.elapsed += remaining;
                self.value = step.sample(self.elapsed);
                remaining = 0.0;
                break;
            }

            remaining -= left;
            self.value = step.to;
            self.index += 1;
            self.elapsed = 0.0;
            if let Some(tag) = step.tag {
                completed.push(tag);
            }
        }

        let finished = self.is_finished();
        TweenStep {
            value: self.value,
            completed,
            finished,
            leftover: if finished {
                Duration::from_secs_f32(remaining.max(0.0))
            } else {
                Duration::ZERO
            },
        }
    }
}
