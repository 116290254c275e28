//! MDL format constants
//!
//! Record sizes, node type flags, MDX attribute bits and the function-pointer
//! pairs that identify the game build a model was compiled for.

// ==================== Record Sizes ====================

pub const FILE_HEADER_SIZE: u64 = 12;
pub const GEOMETRY_HEADER_SIZE: u32 = 80;
pub const MODEL_HEADER_SIZE: u32 = 116;
pub const NODE_HEADER_SIZE: u32 = 80;
pub const LIGHT_HEADER_SIZE: u32 = 92;
pub const EMITTER_HEADER_SIZE: u32 = 224;
pub const REFERENCE_HEADER_SIZE: u32 = 36;
pub const MESH_HEADER_SIZE_K1: u32 = 332;
pub const MESH_HEADER_SIZE_TSL: u32 = 340;
pub const SKIN_HEADER_SIZE: u32 = 100;
pub const DANGLY_HEADER_SIZE: u32 = 28;
pub const AABB_HEADER_SIZE: u32 = 4;
pub const SABER_HEADER_SIZE: u32 = 20;
pub const ANIMATION_HEADER_SIZE: u32 = 136;
pub const FACE_SIZE: u32 = 32;
pub const CONTROLLER_KEY_SIZE: u32 = 16;
pub const EVENT_SIZE: u32 = 36;
pub const AABB_NODE_SIZE: u32 = 40;

// ==================== Geometry Header ====================

pub const MODEL_TYPE_GEOMETRY: u8 = 2;
pub const MODEL_TYPE_ANIMATION: u8 = 5;

/// Stored in name slots for "no model" / "no texture".
pub const NULL_NAME: &str = "NULL";

// ==================== Node Type Flags ====================

pub const NODE_HEADER: u16 = 0x0001;
pub const NODE_LIGHT: u16 = 0x0002;
pub const NODE_EMITTER: u16 = 0x0004;
pub const NODE_REFERENCE: u16 = 0x0010;
pub const NODE_MESH: u16 = 0x0020;
pub const NODE_SKIN: u16 = 0x0040;
pub const NODE_DANGLY: u16 = 0x0100;
pub const NODE_AABB: u16 = 0x0200;
pub const NODE_SABER: u16 = 0x0800;

// ==================== MDX Attributes ====================

pub const MDX_VERTEX: u32 = 0x0001;
pub const MDX_UV1: u32 = 0x0002;
pub const MDX_UV2: u32 = 0x0004;
pub const MDX_UV3: u32 = 0x0008;
pub const MDX_UV4: u32 = 0x0010;
pub const MDX_NORMAL: u32 = 0x0020;
pub const MDX_UV_FLAGS: [u32; 4] = [MDX_UV1, MDX_UV2, MDX_UV3, MDX_UV4];

/// Per-field MDX offset of an absent attribute.
pub const MDX_ABSENT: u32 = 0xFFFF_FFFF;

/// Position written to the padding row that ends each mesh's MDX block.
pub const MDX_TERMINATOR: f32 = 10_000_000.0;

// ==================== Controllers ====================

pub const CONTROLLER_BEZIER: u8 = 0x10;
/// Orientation column count meaning "one packed quaternion per row".
pub const CONTROLLER_PACKED_QUATERNION: u8 = 2;

// ==================== Function Pointers ====================

/// `(fn_ptr1, fn_ptr2)` pairs, indexed `[K1 PC, TSL PC, K1 Xbox, TSL Xbox]`.
pub type FunctionPointers = [(u32, u32); 4];

pub const MODEL_FN_PTRS: FunctionPointers = [
    (4273776, 4216096),
    (4285200, 4216320),
    (4254992, 4255008),
    (4285872, 4216016),
];

pub const ANIMATION_FN_PTRS: FunctionPointers = [
    (4273392, 4451552),
    (4284816, 4522928),
    (4253536, 4573360),
    (4285632, 4519584),
];

pub const MESH_FN_PTRS: FunctionPointers = [
    (4216656, 4216672),
    (4216880, 4216896),
    (4267376, 4264048),
    (4216576, 4216592),
];

pub const SKIN_FN_PTRS: FunctionPointers = [
    (4216592, 4216608),
    (4216816, 4216832),
    (4264032, 4264048),
    (4216512, 4216528),
];

pub const DANGLY_FN_PTRS: FunctionPointers = [
    (4216640, 4216624),
    (4216864, 4216848),
    (4266736, 4266720),
    (4216560, 4216544),
];

// ==================== Lightsaber ====================

/// Blade vertex count the engine writes; only two rings of eight are kept.
pub const SABER_ENGINE_VERTEX_COUNT: usize = 176;
pub const SABER_VERTEX_COUNT: usize = 16;

/// Fixed blade topology over the sixteen kept vertices.
pub const SABER_FACES: [[u32; 3]; 12] = [
    [0, 4, 1],
    [1, 4, 5],
    [1, 5, 2],
    [2, 5, 6],
    [2, 6, 3],
    [3, 6, 7],
    [8, 12, 9],
    [9, 12, 13],
    [9, 13, 10],
    [10, 13, 14],
    [10, 14, 11],
    [11, 14, 15],
];
