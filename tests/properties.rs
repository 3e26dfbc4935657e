//! Properties that must hold for any grid state or light timing.

use clearpath_sim::{
    math::{Point2d, TileCoord},
    spawn::spawn_point,
    ApproachGroup, Heading, LightState, LightTimings, MovementState, Overlay, Simulation,
    SimulationConfig, TrafficLight, VehicleAttributes, VehicleKind,
};
use proptest::prelude::*;

fn heading() -> impl Strategy<Value = Heading> {
    prop::sample::select(Heading::ALL.to_vec())
}

fn light_state() -> impl Strategy<Value = LightState> {
    prop::sample::select(vec![
        LightState::Red,
        LightState::Yellow,
        LightState::Green,
        LightState::FourWayBlink,
    ])
}

proptest! {
    /// An emergency vehicle running code 3 keeps moving whatever is written on the grid.
    #[test]
    fn code3_never_stops(
        heading in heading(),
        overlays in prop::collection::vec((0..24i32, 0..24i32, 0..4u8), 0..200),
        ew in light_state(),
        ns in light_state(),
        preemption in any::<bool>(),
        frames in 1..150usize,
    ) {
        let mut sim = Simulation::with_config(SimulationConfig {
            spawn_chance: 0.0,
            seed: Some(0),
            ..Default::default()
        })
        .unwrap();
        if preemption {
            sim.toggle_preemption();
        }
        sim.force_light_state(ApproachGroup::EastWest, ew);
        sim.force_light_state(ApproachGroup::NorthSouth, ns);

        let parked = sim.add_vehicle(&VehicleAttributes {
            kind: VehicleKind::Civilian,
            heading: Heading::East,
            position: Point2d::new(3.0, 3.0),
            speed: 0.0,
            color: [0, 0, 0],
        });
        let ev = sim.add_vehicle(&VehicleAttributes {
            kind: VehicleKind::Emergency { code3: true },
            heading,
            position: spawn_point(heading, 24),
            speed: 0.14,
            color: [255, 255, 255],
        });
        let light_id = sim.iter_lights().next().map(|(id, _)| id).unwrap();

        for (x, y, kind) in overlays {
            let overlay = match kind {
                0 => Overlay::None,
                1 => Overlay::Occupied(parked),
                2 => Overlay::RedHold(light_id),
                _ => Overlay::FourWayHold,
            };
            sim.grid_mut().set_overlay(TileCoord::new(x, y), overlay);
        }

        for _ in 0..frames {
            sim.step();
            match sim.get_vehicle(ev) {
                Some(veh) => prop_assert_eq!(veh.movement_state(), MovementState::Moving),
                None => break,
            }
        }
    }

    /// A light's timer resets on every state change and only on a state change.
    #[test]
    fn light_timer_resets_only_on_transition(
        green in 1..200u32,
        yellow in 1..200u32,
        red in 1..200u32,
        start in light_state(),
        frames in 0..2000usize,
    ) {
        let timings = LightTimings { green, yellow, red, ticks_per_second: 60 };
        let mut light = TrafficLight::new(
            TileCoord::new(9, 10),
            ApproachGroup::EastWest,
            &[],
            timings,
        );
        light.force_state(start);

        let mut prev = (light.state(), light.since());
        for _ in 0..frames {
            light.step();
            let now = (light.state(), light.since());
            if now.0 == prev.0 {
                let expected = match now.0 {
                    LightState::FourWayBlink => 0,
                    _ => prev.1 + 1,
                };
                prop_assert_eq!(now.1, expected);
            } else {
                prop_assert_eq!(now.1, 0);
            }
            prev = now;
        }
    }
}
