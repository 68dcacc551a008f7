//! Simulation time keeping

/// Step clock for the simulation loop
///
/// The scene feeds it the wall-clock delta of each step; motion integration
/// reads either the scaled or the unscaled delta.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    time_scale: f32,
    delta_time: f32,
    unscaled_delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl SimulationClock {
    /// Create a new clock with the given time scale
    pub fn new(time_scale: f32) -> Self {
        Self {
            time_scale,
            delta_time: 0.0,
            unscaled_delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Advance the clock by one step of `delta_seconds` real time
    pub fn advance(&mut self, delta_seconds: f32) {
        self.unscaled_delta_time = delta_seconds;
        self.delta_time = delta_seconds * self.time_scale;
        self.total_time += self.delta_time;
        self.frame_count += 1;
    }

    /// Scaled time of the last step in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Real time of the last step in seconds
    pub fn unscaled_delta_time(&self) -> f32 {
        self.unscaled_delta_time
    }

    /// Total scaled time since the clock was created
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Number of steps taken
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Current time scale
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Change the time scale; takes effect on the next step
    pub fn set_time_scale(&mut self, time_scale: f32) {
        self.time_scale = time_scale;
    }
}
