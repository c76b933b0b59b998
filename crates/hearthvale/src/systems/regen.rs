//! Passive health regeneration

use rpg_engine::prelude::*;

use crate::components::{Health, Regeneration};

/// Heals entities with [`Regeneration`] a whole point at a time
pub struct RegenSystem {
    required: Vec<ComponentType>,
}

impl RegenSystem {
    /// Creates the system
    pub fn new() -> Self {
        Self {
            required: vec![ComponentType::of::<Health>(), ComponentType::of::<Regeneration>()],
        }
    }
}

impl Default for RegenSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for RegenSystem {
    fn name(&self) -> &str {
        "regen"
    }

    fn required_components(&self) -> &[ComponentType] {
        &self.required
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn update(&mut self, ctx: &mut SystemContext<'_>, delta_time: f32) {
        if ctx.time.is_paused() {
            return;
        }
        let delta_time = ctx.time.scale_delta_time(delta_time);

        for entity in self.get_entities(ctx) {
            let full = ctx.get_component::<Health>(entity).map_or(true, Health::is_full);
            let Some(regen) = ctx.get_component_mut::<Regeneration>(entity) else {
                continue;
            };
            if full {
                regen.carry = 0.0;
                continue;
            }

            regen.carry += regen.per_second.max(0.0) * delta_time;
            let whole = regen.carry.floor();
            regen.carry -= whole;

            if whole >= 1.0 {
                if let Some(health) = ctx.get_component_mut::<Health>(entity) {
                    health.heal(whole as u32);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn world_with_patient(regen: f32) -> (World, Entity) {
        let mut world = World::new();
        let patient = world.create_entity();
        let mut health = Health::new(10);
        health.take_damage(8);
        world.components_mut().add_component(patient, health);
        world.components_mut().add_component(patient, Regeneration::new(regen));
        world.add_system(RegenSystem::new()).unwrap();
        world.initialize().unwrap();
        (world, patient)
    }

    #[test]
    fn test_fractional_healing_accumulates() {
        let (mut world, patient) = world_with_patient(1.5);

        world.update(0.5);
        assert_eq!(world.components().get_component::<Health>(patient).unwrap().current, 2);

        world.update(0.5);
        assert_eq!(world.components().get_component::<Health>(patient).unwrap().current, 3);
        assert_relative_eq!(world.components().get_component::<Regeneration>(patient).unwrap().carry, 0.5);
    }

    #[test]
    fn test_stops_at_full_health() {
        let (mut world, patient) = world_with_patient(4.0);

        world.update(10.0);
        assert!(world.components().get_component::<Health>(patient).unwrap().is_full());

        world.update(0.1);
        assert_relative_eq!(world.components().get_component::<Regeneration>(patient).unwrap().carry, 0.0);
    }

    #[test]
    fn test_entities_without_regeneration_are_untouched() {
        let (mut world, _) = world_with_patient(1.0);
        let bystander = world.create_entity();
        world.components_mut().add_component(bystander, Health { current: 1, max: 10 });

        world.update(5.0);
        assert_eq!(world.components().get_component::<Health>(bystander).unwrap().current, 1);
    }

    #[test]
    fn test_paused_clock_stops_healing() {
        let (mut world, patient) = world_with_patient(2.0);
        world.time_mut().pause();

        world.update(5.0);
        assert_eq!(world.components().get_component::<Health>(patient).unwrap().current, 2);
        assert_relative_eq!(world.components().get_component::<Regeneration>(patient).unwrap().carry, 0.0);

        world.time_mut().resume();
        world.update(1.0);
        assert_eq!(world.components().get_component::<Health>(patient).unwrap().current, 4);
    }
}
