use crate::math::TileCoord;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A traffic light controlling one approach to the intersection.
#[derive(Clone, Debug)]
pub struct TrafficLight {
    /// The tile the light stands on.
    position: TileCoord,
    /// The group of approaches the light belongs to.
    group: ApproachGroup,
    /// The crosswalk tiles held while the light is red.
    tiles: SmallVec<[TileCoord; 2]>,
    /// The current state.
    state: LightState,
    /// The number of frames since the current state was entered.
    since: u32,
    /// The number of frames spent blinking, used only for display.
    blink: u32,
    /// The phase durations.
    timings: LightTimings,
}

/// The state of a traffic light.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LightState {
    Red,
    Yellow,
    Green,
    /// Blinking red, as an all-way stop.
    FourWayBlink,
}

/// The colour shown by a traffic light.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LightColor {
    Red,
    Yellow,
    Green,
    Off,
}

/// The axis of travel a traffic light controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ApproachGroup {
    EastWest,
    NorthSouth,
}

/// The phase durations of a traffic light, in frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LightTimings {
    pub green: u32,
    pub yellow: u32,
    pub red: u32,
    /// The frame rate, used to express durations in seconds.
    pub ticks_per_second: u32,
}

impl ApproachGroup {
    /// Gets the group that crosses this one.
    pub fn crossing(self) -> Self {
        match self {
            ApproachGroup::EastWest => ApproachGroup::NorthSouth,
            ApproachGroup::NorthSouth => ApproachGroup::EastWest,
        }
    }

    /// The state lights in this group resume in when an all-way stop ends.
    /// North-south traffic is released first.
    pub fn resume_state(self) -> LightState {
        match self {
            ApproachGroup::EastWest => LightState::Red,
            ApproachGroup::NorthSouth => LightState::Green,
        }
    }
}

impl TrafficLight {
    /// Creates a traffic light in the resume state of its group.
    pub fn new(
        position: TileCoord,
        group: ApproachGroup,
        tiles: &[TileCoord],
        timings: LightTimings,
    ) -> Self {
        Self {
            position,
            group,
            tiles: tiles.iter().copied().collect(),
            state: group.resume_state(),
            since: 0,
            blink: 0,
            timings,
        }
    }

    /// Advances the traffic light timing by one frame.
    pub fn step(&mut self) {
        if self.state == LightState::FourWayBlink {
            self.blink = self.blink.wrapping_add(1);
            return;
        }

        self.since += 1;
        let next = self.next_state();
        if next != self.state {
            self.state = next;
            self.since = 0;
        }
    }

    /// The state the light moves to given its current timer.
    fn next_state(&self) -> LightState {
        use LightState::*;
        let t = &self.timings;
        match self.state {
            Green if self.since >= t.green => Yellow,
            Yellow if self.since >= t.yellow => Red,
            Red if self.since >= t.red => Green,
            state => state,
        }
    }

    /// Switches the light to a blinking all-way stop.
    pub fn enter_four_way(&mut self) {
        self.state = LightState::FourWayBlink;
        self.since = 0;
        self.blink = 0;
    }

    /// Leaves the all-way stop, returning to the group's resume state.
    pub fn resume(&mut self) {
        self.force_state(self.group.resume_state());
        self.blink = 0;
    }

    /// Puts the light into the given state with a fresh timer.
    pub fn force_state(&mut self, state: LightState) {
        self.state = state;
        self.since = 0;
    }

    /// The tile the light stands on.
    pub fn position(&self) -> TileCoord {
        self.position
    }

    /// The approach group of the light.
    pub fn group(&self) -> ApproachGroup {
        self.group
    }

    /// The crosswalk tiles controlled by this light.
    pub fn tiles(&self) -> &[TileCoord] {
        &self.tiles
    }

    /// The current state.
    pub fn state(&self) -> LightState {
        self.state
    }

    /// The number of frames spent in the current state.
    pub fn since(&self) -> u32 {
        self.since
    }

    /// How long the light has been yellow, in s, or zero if it is not yellow.
    pub fn yellow_duration_secs(&self) -> f64 {
        match self.state {
            LightState::Yellow => self.since as f64 / self.timings.ticks_per_second as f64,
            _ => 0.0,
        }
    }

    /// Whether vehicles approaching this light must stop before its crosswalk.
    ///
    /// A yellow light that has been showing longer than `late_yellow_secs`
    /// counts as red.
    pub fn is_holding(&self, late_yellow_secs: f64) -> bool {
        match self.state {
            LightState::Red => true,
            LightState::Yellow => self.yellow_duration_secs() > late_yellow_secs,
            _ => false,
        }
    }

    /// The colour currently displayed.
    ///
    /// While blinking, the light alternates between red and off every half
    /// second, with the two approach groups out of phase.
    pub fn color(&self) -> LightColor {
        match self.state {
            LightState::Red => LightColor::Red,
            LightState::Yellow => LightColor::Yellow,
            LightState::Green => LightColor::Green,
            LightState::FourWayBlink => {
                let half = u32::max(self.timings.ticks_per_second / 2, 1);
                let phase = (self.blink / half) % 2;
                let lit = match self.group {
                    ApproachGroup::EastWest => phase == 0,
                    ApproachGroup::NorthSouth => phase == 1,
                };
                if lit {
                    LightColor::Red
                } else {
                    LightColor::Off
                }
            }
        }
    }
}
