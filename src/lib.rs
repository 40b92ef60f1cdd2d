// Library root
// -----------
// Client for the photoapp web service. The binary (`main.rs`) wires these
// modules into an interactive session.
//
// Module responsibilities:
// - `config`: reads the `[client]` section of the session's INI file.
// - `api`: HTTP interactions with the service and the records it returns.
// - `geo`: GPS position and timestamp from an image's EXIF block.
// - `ui`: the numeric command menu and the handlers that render replies.
// - `error`: the error taxonomy shared by the modules above.
pub mod api;
pub mod config;
pub mod error;
pub mod geo;
pub mod ui;
