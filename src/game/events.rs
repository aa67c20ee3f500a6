use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Notification emitted by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// A level was loaded and a fresh board is ready
    LevelLoaded,
    /// One step completed
    StateChanged,
    /// The snake ate food during the last step
    AteFood,
    /// The snake crashed
    GameOver,
    /// The game was paused (`false`) or resumed (`true`)
    RunStateChanged(bool),
}

/// Fan-out of [`GameEvent`]s to every subscriber
#[derive(Debug, Default)]
pub struct EventHub {
    subscribers: Vec<UnboundedSender<GameEvent>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new listener
    pub fn subscribe(&mut self) -> UnboundedReceiver<GameEvent> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver `event` to all live subscribers, dropping closed ones
    pub fn emit(&mut self, event: GameEvent) {
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}
