//! Messages exchanged between the host and layers.
//!
//! A message with a recipient is directed; a message without one is a
//! broadcast. The coordinator owns delivery, layers never call each other.

use serde::{Deserialize, Serialize};

use crate::layer::RenderLayerType;
use crate::math::{CanvasPoint, GridPoint, WorkspacePoint};
use crate::quality::QualityLevel;

/// Message type discriminator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// A piece was picked up
    PieceDragStart,
    /// A dragged piece moved
    PieceDragMove,
    /// A dragged piece was released
    PieceDrop,
    /// A piece landed in a grid cell
    PieceSnapped,
    /// Ask the effects layer for a burst at a position
    SpawnEffect,
    /// Quality level changed (broadcast by the coordinator)
    QualityChanged,
    /// Surface geometry, zoom or pan changed
    ViewportChanged,
    /// Application-defined message
    Custom(u16),
}

/// Who sent a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageOrigin {
    /// The host or the coordinator itself
    Host,
    /// One of the registered layers
    Layer(RenderLayerType),
}

/// Message body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum MessagePayload {
    /// No data
    #[default]
    None,
    /// A canvas-space position
    Canvas(CanvasPoint),
    /// A grid cell
    Grid(GridPoint),
    /// A workspace-space position
    Workspace(WorkspacePoint),
    /// A quality level
    Quality(QualityLevel),
    /// A scalar (intensity, progress)
    Scalar(f64),
    /// Free-form text
    Text(String),
}

/// A message routed by the coordinator's bus.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerMessage {
    /// Message type
    pub kind: MessageKind,
    /// Sender
    pub sender: MessageOrigin,
    /// Recipient; `None` means broadcast
    pub recipient: Option<RenderLayerType>,
    /// Body
    pub payload: MessagePayload,
}

impl LayerMessage {
    /// Creates a broadcast message.
    #[must_use]
    pub fn broadcast(kind: MessageKind, sender: MessageOrigin, payload: MessagePayload) -> Self {
        Self {
            kind,
            sender,
            recipient: None,
            payload,
        }
    }

    /// Creates a message for a single layer.
    #[must_use]
    pub fn directed(
        kind: MessageKind,
        sender: MessageOrigin,
        recipient: RenderLayerType,
        payload: MessagePayload,
    ) -> Self {
        Self {
            kind,
            sender,
            recipient: Some(recipient),
            payload,
        }
    }

    /// True if the message has no recipient.
    #[must_use]
    pub const fn is_broadcast(&self) -> bool {
        self.recipient.is_none()
    }
}
