// Module exports for pure logic
pub mod bounds;      // Window geometry record
pub mod bridge;      // IPC operations over a content view
pub mod debounce;    // Pending-write state machine
pub mod lifecycle;   // App phases and platform close convention
pub mod navigation;  // Origin gating and popup suppression
pub mod request_filter; // Page-side interception of subresource requests
