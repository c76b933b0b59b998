//! Village calendar driven by game time

use log::{debug, warn};
use rpg_engine::prelude::*;

use crate::components::TimeOfDay;
use crate::events::DAY_STARTED;

/// Advances every [`TimeOfDay`] and announces new days
pub struct TimeOfDaySystem {
    required: Vec<ComponentType>,
    hours_per_second: f32,
    start_hour: f32,
}

impl TimeOfDaySystem {
    /// Creates a calendar that moves `hours_per_second` game hours per game second
    pub fn new(hours_per_second: f32, start_hour: f32) -> Self {
        Self {
            required: vec![ComponentType::of::<TimeOfDay>()],
            hours_per_second,
            start_hour,
        }
    }
}

impl System for TimeOfDaySystem {
    fn name(&self) -> &str {
        "time_of_day"
    }

    fn required_components(&self) -> &[ComponentType] {
        &self.required
    }

    fn on_initialize(&mut self, ctx: &mut SystemContext<'_>) -> Result<(), SystemError> {
        if self.get_entities(ctx).is_empty() {
            let calendar = ctx.create_entity();
            ctx.add_component(calendar, TimeOfDay::new(1, self.start_hour));
            debug!("Created village calendar {calendar}");
        }
        Ok(())
    }

    fn update(&mut self, ctx: &mut SystemContext<'_>, delta_time: f32) {
        if ctx.time.is_paused() {
            return;
        }
        let hours = ctx.time.scale_delta_time(delta_time) * self.hours_per_second;

        for entity in self.get_entities(ctx) {
            let Some(clock) = ctx.get_component_mut::<TimeOfDay>(entity) else {
                continue;
            };
            let crossed = clock.advance(hours);
            let today = clock.day;

            for day in (today - crossed + 1)..=today {
                debug!("Day {day} begins");
                let event = Event::new(DAY_STARTED).with_arg("day", day);
                if let Err(err) = ctx.emit(event) {
                    warn!("Could not announce day {day}: {err}");
                }
            }
        }
    }
}
