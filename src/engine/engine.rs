//! The top-level engine context.
//!
//! `GameEngine` wires the motion detector, the audio volume monitor, and
//! the turn orchestrator together and is the host's single point of
//! contact: the host feeds it ticks, frames, and audio samples, drives the
//! peer client's transport callbacks, and renders from its accessors.
//! Every fatal condition converges here on [`MatchState::Error`] with the
//! error recorded as `last_error`.

use tracing::warn;

use super::turn::TurnOrchestrator;
use super::EngineError;
use crate::audio::VolumeMonitor;
use crate::core::GameSettings;
use crate::motion::{FrameBuffer, Hotspot, HotspotMotionAccumulator, MotionDetector, Rect};
use crate::net::{Connection, PeerClient, PeerEvent};
use crate::spell::{Element, Spell, SpellBook};
use crate::state::{MatchState, StateMachine};

/// The hotspot layout the engine registers by default: one region per
/// element, arranged around the edges of the frame so the player's body
/// stays clear of the centre.
#[must_use]
pub fn default_hotspots() -> Vec<Hotspot> {
    vec![
        Hotspot::new(Element::Water.name(), Rect::new(0.0, 0.7, 0.25, 0.25)),
        Hotspot::new(Element::Fire.name(), Rect::new(0.05, 0.35, 0.25, 0.25)),
        Hotspot::new(Element::Light.name(), Rect::new(0.225, 0.025, 0.25, 0.25)),
        Hotspot::new(Element::Dark.name(), Rect::new(0.525, 0.025, 0.25, 0.25)),
        Hotspot::new(Element::Air.name(), Rect::new(0.7, 0.35, 0.25, 0.25)),
        Hotspot::new(Element::Earth.name(), Rect::new(0.75, 0.7, 0.25, 0.25)),
    ]
}

/// The assembled battle engine for one session.
pub struct GameEngine {
    settings: GameSettings,
    detector: MotionDetector,
    volume: VolumeMonitor,
    orchestrator: TurnOrchestrator,
    last_error: Option<String>,
}

impl GameEngine {
    /// Build an engine from settings.
    ///
    /// Registers the default element hotspots and pairs each element's
    /// hotspot with its opposing element's, so opposite charges drain each
    /// other.
    #[must_use]
    pub fn new(settings: GameSettings) -> Self {
        let mut detector = MotionDetector::new(
            settings.grid_rows,
            settings.grid_columns,
            settings.motion_detection_threshold,
        );
        detector.register_hotspots(default_hotspots());

        let mut accumulator = HotspotMotionAccumulator::new(settings.accumulated_motion_decay);
        for element in Element::ALL {
            // The reverse pairing is already in place for the second of
            // each pair; register_exclusive_pair rejects it
            accumulator.register_exclusive_pair(element.name(), element.opposing().name());
        }

        let volume = VolumeMonitor::new(settings.audio_trigger_min, settings.audio_trigger_max);

        let orchestrator = TurnOrchestrator::new(
            settings.clone(),
            StateMachine::new(),
            SpellBook::new(),
            accumulator,
            PeerClient::new(),
        );

        Self {
            settings,
            detector,
            volume,
            orchestrator,
            last_error: None,
        }
    }

    // === Session lifecycle ===

    /// Begin the session: wait for the host to acquire media.
    pub fn start(&mut self) {
        self.orchestrator.set_state(MatchState::AwaitingMedia);
    }

    /// The host acquired its media streams; enter the lobby.
    pub fn on_media_ready(&mut self) {
        self.orchestrator.set_state(MatchState::Idle);
    }

    /// The host failed to acquire media streams. Unrecoverable.
    pub fn on_media_error(&mut self) {
        self.fail(EngineError::MediaUnavailable.to_string());
    }

    /// The transport assigned us an identifier.
    pub fn set_local_player_id(&mut self, id: impl Into<String>) {
        self.orchestrator.local_player_mut().set_id(id);
    }

    /// Advance the engine by one tick.
    ///
    /// `frame` and `audio` are this tick's media, when the source delivered
    /// any. Motion detection runs only during the attack and defend phases
    /// and only while the voice volume sits in the trigger zone; elapsed
    /// time is applied to the motion table before the frame is processed.
    ///
    /// On error the engine records the message, enters
    /// [`MatchState::Error`], and returns the error.
    pub fn tick(
        &mut self,
        elapsed_ms: f64,
        frame: Option<&FrameBuffer>,
        audio: Option<&[u8]>,
    ) -> Result<Vec<PeerEvent>, EngineError> {
        if let Some(samples) = audio {
            self.volume.consume_samples(samples);
        }

        let gesturing = matches!(
            self.orchestrator.state(),
            MatchState::Attacking | MatchState::Defending
        );
        self.detector.set_enabled(gesturing && self.volume.is_in_trigger_zone());

        self.orchestrator.accumulator_mut().set_elapsed(elapsed_ms);
        if let Some(frame) = frame {
            self.detector.consume_frame(frame, self.orchestrator.accumulator_mut());
        }

        match self.orchestrator.update(elapsed_ms) {
            Ok(events) => Ok(events),
            Err(error) => {
                self.fail(error.to_string());
                Err(error)
            }
        }
    }

    // === Lobby and match actions ===

    /// Initiate a battle with a peer over the given connection.
    pub fn request_battle(&mut self, connection: Box<dyn Connection>) {
        self.orchestrator.request_battle(connection);
    }

    /// Accept the most recently received battle request.
    pub fn accept_battle(&mut self) -> Result<(), EngineError> {
        self.orchestrator.accept_battle()
    }

    /// Decline the most recently received battle request.
    pub fn decline_battle(&mut self) {
        self.orchestrator.decline_battle();
    }

    /// Cast immediately instead of waiting for the phase countdown.
    pub fn cast_now(&mut self) -> Result<(), EngineError> {
        self.orchestrator.cast_now()
    }

    // === Accessors ===

    /// The engine settings.
    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// The current match state.
    #[must_use]
    pub fn state(&self) -> MatchState {
        self.orchestrator.state()
    }

    /// The most recent fatal error, if the engine is in the error state.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The turn orchestrator.
    #[must_use]
    pub fn orchestrator(&self) -> &TurnOrchestrator {
        &self.orchestrator
    }

    /// The turn orchestrator, mutably (transport callbacks, observers).
    pub fn orchestrator_mut(&mut self) -> &mut TurnOrchestrator {
        &mut self.orchestrator
    }

    /// The registered motion hotspots.
    #[must_use]
    pub fn hotspots(&self) -> &[Hotspot] {
        self.detector.hotspots()
    }

    /// The audio volume monitor.
    #[must_use]
    pub fn volume(&self) -> &VolumeMonitor {
        &self.volume
    }

    /// The spell cast in the local player's most recent completed phase.
    #[must_use]
    pub fn last_spell_cast(&self) -> Option<&Spell> {
        self.orchestrator.last_spell_cast()
    }

    /// Record a fatal error and converge on the error state.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "engine entering error state");
        self.last_error = Some(message);
        self.orchestrator.set_state(MatchState::Error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullConnection;

    impl Connection for NullConnection {
        fn send(&mut self, _payload: &str) {}
        fn close(&mut self) {}
    }

    fn engine_in_state(state: MatchState) -> GameEngine {
        let mut engine = GameEngine::new(GameSettings::default());
        engine.start();
        engine.on_media_ready();
        engine.orchestrator_mut().client_mut().accept_incoming(Box::new(NullConnection));
        engine.tick(0.0, None, None).unwrap();
        if state != MatchState::Idle {
            engine.orchestrator_mut().set_state(state);
        }
        engine
    }

    /// A frame pair differing over the Fire hotspot region.
    fn fire_frames() -> (FrameBuffer, FrameBuffer) {
        let base = FrameBuffer::black(64, 64);
        let mut moved = FrameBuffer::black(64, 64);
        // Fire hotspot is at (0.05, 0.35) with size 0.25x0.25
        for y in 23..38 {
            for x in 4..19 {
                moved.set_pixel(x, y, 0xFF, 0xFF, 0xFF);
            }
        }
        (base, moved)
    }

    #[test]
    fn test_media_lifecycle() {
        let mut engine = GameEngine::new(GameSettings::default());
        engine.start();
        assert_eq!(engine.state(), MatchState::AwaitingMedia);

        engine.on_media_ready();
        assert_eq!(engine.state(), MatchState::Idle);
    }

    #[test]
    fn test_media_failure_is_fatal() {
        let mut engine = GameEngine::new(GameSettings::default());
        engine.start();
        engine.on_media_error();

        assert_eq!(engine.state(), MatchState::Error);
        assert!(engine.last_error().unwrap().contains("media"));
    }

    #[test]
    fn test_default_hotspots_cover_all_elements() {
        let engine = GameEngine::new(GameSettings::default());
        let hotspots = engine.hotspots();

        assert_eq!(hotspots.len(), 6);
        for element in Element::ALL {
            assert!(hotspots.iter().any(|h| h.name == element.name()));
        }
    }

    #[test]
    fn test_opposing_hotspots_are_exclusive() {
        let engine = GameEngine::new(GameSettings::default());
        let accumulator = engine.orchestrator().accumulator();

        for element in Element::ALL {
            assert_eq!(
                accumulator.opposing_hotspot(element.name()),
                Some(element.opposing().name())
            );
        }
    }

    #[test]
    fn test_motion_accumulates_while_attacking_and_loud() {
        let mut engine = engine_in_state(MatchState::Attacking);
        let (base, moved) = fire_frames();
        let voiced = vec![20u8; 32]; // inside the default trigger zone

        engine.tick(16.0, Some(&base), Some(&voiced)).unwrap();
        engine.tick(16.0, Some(&moved), Some(&voiced)).unwrap();

        assert!(engine.orchestrator().accumulator().charge("Fire") > 0.0);
    }

    #[test]
    fn test_motion_ignored_when_silent() {
        let mut engine = engine_in_state(MatchState::Attacking);
        let (base, moved) = fire_frames();
        let silent = vec![0u8; 32];

        engine.tick(16.0, Some(&base), Some(&silent)).unwrap();
        engine.tick(16.0, Some(&moved), Some(&silent)).unwrap();

        assert_eq!(engine.orchestrator().accumulator().charge("Fire"), 0.0);
    }

    #[test]
    fn test_motion_ignored_outside_gesture_phases() {
        let mut engine = engine_in_state(MatchState::WaitingForDefence);
        let (base, moved) = fire_frames();
        let voiced = vec![20u8; 32];

        engine.tick(16.0, Some(&base), Some(&voiced)).unwrap();
        engine.tick(16.0, Some(&moved), Some(&voiced)).unwrap();

        assert_eq!(engine.orchestrator().accumulator().charge("Fire"), 0.0);
    }

    #[test]
    fn test_missing_frame_is_skipped() {
        let mut engine = engine_in_state(MatchState::Attacking);
        let (base, moved) = fire_frames();
        let voiced = vec![20u8; 32];

        engine.tick(16.0, Some(&base), Some(&voiced)).unwrap();
        engine.tick(16.0, None, Some(&voiced)).unwrap(); // dropped capture
        engine.tick(16.0, Some(&moved), Some(&voiced)).unwrap();

        assert!(engine.orchestrator().accumulator().charge("Fire") > 0.0);
    }

    #[test]
    fn test_disconnect_mid_match_converges_on_error_state() {
        let mut engine = engine_in_state(MatchState::Attacking);

        engine.orchestrator_mut().client_mut().on_closed();
        let error = engine.tick(16.0, None, None).unwrap_err();

        assert!(matches!(error, EngineError::PeerDisconnected));
        assert_eq!(engine.state(), MatchState::Error);
        assert!(engine.last_error().unwrap().contains("disconnected"));
    }

    #[test]
    fn test_disconnect_while_awaiting_media_is_harmless() {
        let mut engine = GameEngine::new(GameSettings::default());
        engine.start();
        engine.orchestrator_mut().client_mut().accept_incoming(Box::new(NullConnection));
        engine.orchestrator_mut().client_mut().on_closed();

        engine.tick(16.0, None, None).unwrap();

        assert_eq!(engine.state(), MatchState::AwaitingMedia);
        assert_eq!(engine.last_error(), None);
    }

    #[test]
    fn test_disconnect_in_lobby_is_harmless() {
        let mut engine = engine_in_state(MatchState::Idle);

        engine.orchestrator_mut().client_mut().on_closed();
        engine.tick(16.0, None, None).unwrap();

        assert_eq!(engine.state(), MatchState::Idle);
        assert_eq!(engine.last_error(), None);
    }

    #[test]
    fn test_illegal_transition_converges_on_error_state() {
        let mut engine = engine_in_state(MatchState::Idle);

        // Arm the ReadyUp countdown, then slip back to Idle behind the
        // orchestrator's back so the countdown goes stale
        engine.orchestrator_mut().set_state(MatchState::ReadyUp);
        engine.orchestrator_mut().machine_mut().set_state(MatchState::Idle);

        let error = engine.tick(4000.0, None, None).unwrap_err();
        assert!(matches!(error, EngineError::State(_)));
        assert_eq!(engine.state(), MatchState::Error);
    }
}
