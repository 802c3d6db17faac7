//! Pub-sub notifications emitted after each sampling tick.
//!
//! The engine itself stays synchronous and owns its rings. Tasks that only
//! need to react to new data (status LED, loggers, renderers) subscribe to an
//! [`EventChannel`] instead of reading the engine between ticks.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pubsub::{PubSubChannel, Publisher, Subscriber};
use log::warn;

use crate::engine::TickOutcome;
use crate::sample::{AveragedSample, Sample};

/// Queued events before the oldest is overwritten
///
/// A tick emits at most two events (sample + average), so this covers four
/// ticks of backlog, i.e. 40 s at the default cadence.
pub const EVENT_CHANNEL_CAPACITY: usize = 8;

/// Listeners: the firmware's LED blinker and one console or renderer
/// (the simulator's report loop).
pub const EVENT_SUBSCRIBERS: usize = 2;

/// Only the sampling loop that owns the [`Aggregator`](crate::Aggregator) publishes.
pub const EVENT_PUBLISHERS: usize = 1;

/// Events published after a tick to notify subscribers of new data
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoggerEvent {
    /// A raw sample was written at `index` of the raw ring
    Sampled { index: usize, sample: Sample },
    /// An averaging window completed and was written at `slot` of the average ring
    Averaged {
        slot: usize,
        average: AveragedSample,
    },
}

pub type EventChannel = PubSubChannel<
    CriticalSectionRawMutex,
    LoggerEvent,
    EVENT_CHANNEL_CAPACITY,
    EVENT_SUBSCRIBERS,
    EVENT_PUBLISHERS,
>;

pub type EventPublisher<'a> = Publisher<
    'a,
    CriticalSectionRawMutex,
    LoggerEvent,
    EVENT_CHANNEL_CAPACITY,
    EVENT_SUBSCRIBERS,
    EVENT_PUBLISHERS,
>;

pub type EventSubscriber<'a> = Subscriber<
    'a,
    CriticalSectionRawMutex,
    LoggerEvent,
    EVENT_CHANNEL_CAPACITY,
    EVENT_SUBSCRIBERS,
    EVENT_PUBLISHERS,
>;

/// Publish the events of one tick without waiting
///
/// The sampling task must never block on a slow subscriber; when the channel
/// is full the oldest message is dropped and that subscriber sees a lag.
pub fn publish_outcome(publisher: &EventPublisher<'_>, outcome: &TickOutcome) {
    for event in outcome.events() {
        if publisher.free_capacity() == 0 {
            warn!("Logger event channel full, dropping oldest event");
        }
        publisher.publish_immediate(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SamplingConfig;
    use crate::engine::Aggregator;
    use embassy_sync::pubsub::WaitResult;

    #[test]
    fn test_tick_events_reach_subscribers() {
        let channel = EventChannel::new();
        let publisher = channel.publisher().unwrap();
        let mut subscriber = channel.subscriber().unwrap();

        // 1 h at 60 s samples and 5 min windows: 5 samples per window.
        let geometry = SamplingConfig {
            sample_interval_secs: 60,
            average_interval_min: 5,
            total_hours: 1,
        }
        .geometry()
        .unwrap();
        let mut engine = Aggregator::new(geometry);
        let mut reader = || [1.0f32, 2.0, 3.0, 4.0];

        for tick in 1..=5u32 {
            let outcome = engine.on_tick(&mut reader, &|| tick * 60);
            publish_outcome(&publisher, &outcome);
        }

        let mut sampled = 0;
        let mut averaged = 0;
        while let Some(result) = subscriber.try_next_message() {
            match result {
                WaitResult::Message(LoggerEvent::Sampled { index, sample }) => {
                    assert_eq!(index, sampled);
                    assert_eq!(sample.voltages, [1.0, 2.0, 3.0, 4.0]);
                    sampled += 1;
                }
                WaitResult::Message(LoggerEvent::Averaged { slot, average }) => {
                    assert_eq!(slot, 0);
                    assert_eq!(average.timestamp, 300);
                    averaged += 1;
                }
                WaitResult::Lagged(missed) => panic!("unexpected lag of {missed}"),
            }
        }

        assert_eq!(sampled, 5);
        assert_eq!(averaged, 1);
    }

    #[test]
    fn test_capacity_covers_four_ticks_without_lag() {
        let channel = EventChannel::new();
        let publisher = channel.publisher().unwrap();
        let mut subscriber = channel.subscriber().unwrap();

        // One sample per window: every tick emits both events.
        let geometry = SamplingConfig {
            sample_interval_secs: 60,
            average_interval_min: 1,
            total_hours: 1,
        }
        .geometry()
        .unwrap();
        let mut engine = Aggregator::new(geometry);
        let mut reader = || [0.5f32, 0.0, 0.0, 0.0];

        for tick in 1..=4u32 {
            let outcome = engine.on_tick(&mut reader, &|| tick);
            assert_eq!(outcome.events().count(), 2);
            publish_outcome(&publisher, &outcome);
        }

        let mut received = 0;
        while let Some(result) = subscriber.try_next_message() {
            assert!(matches!(result, WaitResult::Message(_)));
            received += 1;
        }
        assert_eq!(received, EVENT_CHANNEL_CAPACITY);
    }
}
