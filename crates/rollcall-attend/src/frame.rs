/// A decoded pixel frame handed in by the transport layer, in whatever
/// layout the configured extractor backend expects.
#[derive(Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}
