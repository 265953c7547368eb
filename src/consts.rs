pub const BYTES_PER_MB: u64 = 1024 * 1024;
pub const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;
pub const BYTES_PER_KB: u64 = 1024;        // sysinfo reports memory in KiB

pub const MINIMUM_RAM_IN_GB: u64 = 8;
pub const MINIMUM_SSD_SIZE_IN_GB: u64 = 256;
pub const MINIMUM_VRAM_FOR_DISCRETE_IN_GB: u64 = 3;
pub const MINIMUM_VRAM_FOR_INTEGRATED_IN_GB: u64 = 1;
pub const FREE_SPACE_THRESHOLD_IN_GB: u64 = 15;

pub const MINIMUM_OS_VERSION: (u32, u32) = (11, 0);
pub const MINIMUM_I5_GENERATION: u32 = 13;

pub const UNKNOWN: &str = "Unknown";
