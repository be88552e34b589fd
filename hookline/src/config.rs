use resp_proto::ParseOptions;

/// Per-connection buffer and decoding configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Initial capacity of the input buffer.
    pub recv_buffer_capacity: usize,
    /// Initial capacity of the output buffer.
    pub send_buffer_capacity: usize,
    /// Bytes requested from the transport per read call. A readiness event
    /// keeps reading in chunks of this size until the transport would block.
    pub read_chunk_size: usize,
    /// Limits applied when decoding replies.
    pub parse_options: ParseOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recv_buffer_capacity: 16 * 1024,
            send_buffer_capacity: 16 * 1024,
            read_chunk_size: 16 * 1024,
            parse_options: ParseOptions::new(),
        }
    }
}

impl Config {
    /// Set the initial capacity of the input buffer.
    pub fn recv_buffer_capacity(mut self, capacity: usize) -> Self {
        self.recv_buffer_capacity = capacity;
        self
    }

    /// Set the initial capacity of the output buffer.
    pub fn send_buffer_capacity(mut self, capacity: usize) -> Self {
        self.send_buffer_capacity = capacity;
        self
    }

    /// Set the per-call read size. Zero is raised to one byte.
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    /// Set the reply decoding limits.
    pub fn parse_options(mut self, options: ParseOptions) -> Self {
        self.parse_options = options;
        self
    }
}
