mod array;
mod texture;
mod value;
mod variable;

pub use array::{ArrayVariable, MatrixArrayVariable, MAX_BONE_TRANSFORMS};
pub use texture::TextureVariable;
pub use value::{ShaderValue, VariableKind};
pub use variable::ShaderVariable;
