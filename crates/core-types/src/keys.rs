/// Identifier naming a category of realtime notification.
///
/// Keys are matched exactly; there is no wildcard or hierarchy scheme.
/// Any string is a valid key; the backend is the only authority on
/// which keys actually produce traffic.
pub type EventKey = String;

/// Event keys produced by the dashboard backend.
///
/// The registry never validates against this list; it exists so that
/// application components and the CLI agree on spelling.
pub mod well_known {
    /// Price tick for a traded instrument.
    pub const PRICE_UPDATE: &str = "price_update";
    /// State change of a working order.
    pub const ORDER_UPDATE: &str = "order_update";
    /// Snapshot change of the player's portfolio.
    pub const PORTFOLIO_UPDATE: &str = "portfolio_update";
    /// Membership change in the multiplayer lobby.
    pub const LOBBY_UPDATE: &str = "lobby_update";
    /// Default key assigned to inbound frames that carry no envelope.
    pub const MESSAGE: &str = "message";
}
