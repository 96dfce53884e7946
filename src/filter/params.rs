//! Parameter structures for stream filters

/// Parameters for FlateDecode
#[derive(Debug, Clone)]
pub struct FlateDecodeParams {
    /// Predictor algorithm (1 = none, 2 = TIFF, 10-15 = PNG)
    pub predictor: i32,
    /// Color components per sample
    pub colors: i32,
    /// Bits per color component
    pub bits_per_component: i32,
    /// Samples per row
    pub columns: i32,
}

impl Default for FlateDecodeParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
        }
    }
}

/// Parameters for LZWDecode
#[derive(Debug, Clone)]
pub struct LZWDecodeParams {
    /// Predictor algorithm
    pub predictor: i32,
    /// Color components per sample
    pub colors: i32,
    /// Bits per color component
    pub bits_per_component: i32,
    /// Samples per row
    pub columns: i32,
    /// Code length switches one code early when 1
    pub early_change: i32,
}

impl Default for LZWDecodeParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
            early_change: 1,
        }
    }
}
