/// Owned byte storage backing one attribute's values.
#[derive(Debug, Default, Clone)]
pub struct DataBuffer {
    data: Vec<u8>,
}

impl DataBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resize(&mut self, new_size: usize) {
        self.data.resize(new_size, 0);
    }

    pub fn data_size(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn read(&self, byte_pos: usize, out_data: &mut [u8]) {
        out_data.copy_from_slice(&self.data[byte_pos..byte_pos + out_data.len()]);
    }

    pub fn write(&mut self, byte_pos: usize, in_data: &[u8]) {
        if byte_pos + in_data.len() > self.data.len() {
            self.data.resize(byte_pos + in_data.len(), 0);
        }
        self.data[byte_pos..byte_pos + in_data.len()].copy_from_slice(in_data);
    }

    pub fn update(&mut self, data: &[u8]) {
        self.data.clear();
        self.data.extend_from_slice(data);
    }
}
