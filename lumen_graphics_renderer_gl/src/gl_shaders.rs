/// GLSL sources of the built-in programs
///
/// The sources are written once against a small set of macros so the same
/// body compiles as GLSL 1.x (ES2, legacy desktop) and GLSL 3.x.

use lumen_graphics::lumen::device::{DriverInfo, StandardShader, ATTRIB_COLOR, ATTRIB_POS, ATTRIB_TEXCOORD};

/// Attribute names bound to the built-in locations before linking
pub const ATTRIBUTE_BINDINGS: [(u32, &str); 3] = [
    (ATTRIB_POS, "VertexPosition"),
    (ATTRIB_TEXCOORD, "VertexTexCoord"),
    (ATTRIB_COLOR, "VertexColor"),
];

// Built-in uniform names
pub const UNIFORM_PROJECTION: &str = "lumen_Projection";
pub const UNIFORM_SCREEN_SIZE: &str = "lumen_ScreenSize";
pub const UNIFORM_POINT_SIZE: &str = "lumen_PointSize";
pub const UNIFORM_CONSTANT_COLOR: &str = "lumen_ConstantColor";
pub const UNIFORM_TEXTURE: &str = "MainTex";

/// GLSL dialect a context compiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlslVersion {
    /// `#version 100` (ES2)
    Es100,
    /// `#version 300 es`
    Es300,
    /// `#version 120` (legacy desktop contexts)
    Glsl120,
    /// `#version 330 core`
    Glsl330,
}

impl GlslVersion {
    pub fn for_driver(info: &DriverInfo) -> GlslVersion {
        match (info.is_embedded(), info.version >= (3, 0), info.desktop_at_least(3, 3)) {
            (true, true, _) => GlslVersion::Es300,
            (true, false, _) => GlslVersion::Es100,
            (false, _, true) => GlslVersion::Glsl330,
            (false, _, false) => GlslVersion::Glsl120,
        }
    }

    pub fn is_glsl3(self) -> bool {
        matches!(self, GlslVersion::Es300 | GlslVersion::Glsl330)
    }

    fn header(self) -> &'static str {
        match self {
            GlslVersion::Es100 => "#version 100\nprecision highp float;\n",
            GlslVersion::Es300 => "#version 300 es\nprecision highp float;\nprecision highp sampler2DArray;\n",
            GlslVersion::Glsl120 => "#version 120\n",
            GlslVersion::Glsl330 => "#version 330 core\n",
        }
    }
}

const VERTEX_MACROS_GLSL1: &str = "#define IN attribute\n#define OUT varying\n";
const VERTEX_MACROS_GLSL3: &str = "#define IN in\n#define OUT out\n";
const FRAGMENT_MACROS_GLSL1: &str =
    "#define IN varying\n#define FRAG_COLOR gl_FragColor\n#define TEX2D texture2D\n";
const FRAGMENT_MACROS_GLSL3: &str =
    "#define IN in\n#define TEX2D texture\nout vec4 lumen_FragColor;\n#define FRAG_COLOR lumen_FragColor\n";

const VERTEX_BODY: &str = r#"
uniform mat4 lumen_Projection;
uniform vec4 lumen_ScreenSize;
uniform float lumen_PointSize;
uniform vec4 lumen_ConstantColor;

IN vec4 VertexPosition;
IN vec4 VertexTexCoord;
IN vec4 VertexColor;

OUT vec4 VaryingTexCoord;
OUT vec4 VaryingColor;

void main() {
    VaryingTexCoord = VertexTexCoord;
    VaryingColor = VertexColor * lumen_ConstantColor;
    gl_PointSize = lumen_PointSize;
    gl_Position = lumen_Projection * VertexPosition;
}
"#;

const FRAGMENT_BODY_2D: &str = r#"
uniform sampler2D MainTex;

IN vec4 VaryingTexCoord;
IN vec4 VaryingColor;

void main() {
    FRAG_COLOR = TEX2D(MainTex, VaryingTexCoord.st) * VaryingColor;
}
"#;

const FRAGMENT_BODY_ARRAY: &str = r#"
uniform sampler2DArray MainTex;

in vec4 VaryingTexCoord;
in vec4 VaryingColor;

void main() {
    FRAG_COLOR = texture(MainTex, VaryingTexCoord.stp) * VaryingColor;
}
"#;

/// Vertex and fragment source of a built-in program
///
/// `None` when the dialect cannot express the program (array textures
/// need GLSL 3).
pub fn standard_program_source(kind: StandardShader, glsl: GlslVersion) -> Option<(String, String)> {
    let (vertex_macros, fragment_macros) = if glsl.is_glsl3() {
        (VERTEX_MACROS_GLSL3, FRAGMENT_MACROS_GLSL3)
    } else {
        (VERTEX_MACROS_GLSL1, FRAGMENT_MACROS_GLSL1)
    };

    let fragment_body = match kind {
        StandardShader::Default => FRAGMENT_BODY_2D,
        StandardShader::Array if glsl.is_glsl3() => FRAGMENT_BODY_ARRAY,
        StandardShader::Array => return None,
    };

    let header = glsl.header();
    let vertex = format!("{}{}{}", header, vertex_macros, VERTEX_BODY);
    let fragment = format!("{}{}{}", header, fragment_macros, fragment_body);
    Some((vertex, fragment))
}

#[cfg(test)]
#[path = "gl_shaders_tests.rs"]
mod tests;
