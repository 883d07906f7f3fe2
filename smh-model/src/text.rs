//! Human-readable model dump (`.smhmt`)
//!
//! Sections appear in wire order, each headed by its size. The output is meant
//! for inspection and diffing; there is no reader for it.

use std::io::{self, Write};

use crate::model::{Material, Model, Node};
use crate::FACE_SIZE;

/// Write a model as indented text
///
/// `indent` is repeated once per nesting level.
pub fn write_text<W: Write>(model: &Model, mut output: W, indent: &str) -> io::Result<()> {
    let mut out = TextWriter {
        output: &mut output,
        indent,
    };

    out.line(
        0,
        format_args!("Global properties (size: {}):", model.global_properties.len()),
    )?;
    out.properties(1, &model.global_properties)?;
    out.blank()?;

    out.line(0, format_args!("Points (size: {}):", model.points.len()))?;
    for point in &model.points {
        out.line(1, format_args!("{}", floats(point)))?;
    }
    out.blank()?;

    out.line(0, format_args!("Normals (size: {}):", model.normals.len()))?;
    for normal in &model.normals {
        out.line(1, format_args!("{}", floats(normal)))?;
    }
    out.blank()?;

    out.line(
        0,
        format_args!("Texture coordinates (size: {}):", model.tex_coords.len()),
    )?;
    for tex_coord in &model.tex_coords {
        out.line(1, format_args!("{}", floats(tex_coord)))?;
    }
    out.blank()?;

    out.line(0, format_args!("Parts (size: {}):", model.parts.len()))?;
    for (i, part) in model.parts.iter().enumerate() {
        out.line(
            1,
            format_args!(
                "Part[{i}] (faces: {}, values: {}):",
                part.len() / FACE_SIZE,
                part.len()
            ),
        )?;
        let width = part.iter().max().map_or(1, |max| max.to_string().len());
        for face in part.chunks(FACE_SIZE) {
            let face = face
                .iter()
                .map(|index| format!("{index:>width$}"))
                .collect::<Vec<_>>()
                .join(", ");
            out.line(2, format_args!("{face}"))?;
        }
    }
    out.blank()?;

    out.line(0, format_args!("Materials (size: {}):", model.materials.len()))?;
    for (i, material) in model.materials.iter().enumerate() {
        out.line(1, format_args!("Material[{i}]:"))?;
        out.material(2, material)?;
    }
    out.blank()?;

    out.line(0, format_args!("Nodes (size: {}):", model.nodes.len()))?;
    out.nodes(&model.nodes)?;

    output.flush()
}

struct TextWriter<'a, W> {
    output: &'a mut W,
    indent: &'a str,
}

impl<W: Write> TextWriter<'_, W> {
    fn line(&mut self, depth: usize, text: std::fmt::Arguments<'_>) -> io::Result<()> {
        for _ in 0..depth {
            self.output.write_all(self.indent.as_bytes())?;
        }
        self.output.write_fmt(text)?;
        self.output.write_all(b"\n")
    }

    fn blank(&mut self) -> io::Result<()> {
        self.output.write_all(b"\n")
    }

    fn properties(&mut self, depth: usize, properties: &[String]) -> io::Result<()> {
        for (i, property) in properties.iter().enumerate() {
            self.line(depth, format_args!("[{i}] {property}"))?;
        }
        Ok(())
    }

    fn material(&mut self, depth: usize, material: &Material) -> io::Result<()> {
        self.line(depth, format_args!("Ambient: {:?}", material.ambient))?;
        self.line(depth, format_args!("Diffuse: {:?}", material.diffuse))?;
        self.line(depth, format_args!("Specular: {:?}", material.specular))?;
        self.line(depth, format_args!("Opacity: {}", material.opacity))?;
        self.line(depth, format_args!("Shininess: {}", material.shininess))?;
        self.line(
            depth,
            format_args!("Diffuse texture: {}", texture(&material.diffuse_texture)),
        )?;
        self.line(
            depth,
            format_args!("Specular texture: {}", texture(&material.specular_texture)),
        )
    }

    /// Write the node forest, children nested two levels below their parent
    fn nodes(&mut self, roots: &[Node]) -> io::Result<()> {
        let mut stack: Vec<(&Node, String, usize)> = roots
            .iter()
            .enumerate()
            .rev()
            .map(|(i, node)| (node, format!("Node[{i}]:"), 1))
            .collect();

        while let Some((node, label, depth)) = stack.pop() {
            self.line(depth, format_args!("{label}"))?;

            let depth = depth + 1;
            self.line(depth, format_args!("ID: {}", node.id))?;
            self.line(depth, format_args!("Translation: {}", floats(&node.translation)))?;
            self.line(depth, format_args!("Rotation: {}", floats(&node.rotation)))?;
            self.line(depth, format_args!("Scale: {}", floats(&node.scale)))?;

            self.line(
                depth,
                format_args!("Properties (size: {}):", node.properties.len()),
            )?;
            self.properties(depth + 1, &node.properties)?;

            self.line(
                depth,
                format_args!("Parts (size: {}):", node.node_parts.len()),
            )?;
            for node_part in &node.node_parts {
                self.line(
                    depth + 1,
                    format_args!(
                        "part {} -> material {}",
                        node_part.part_index, node_part.material_index
                    ),
                )?;
            }

            self.line(
                depth,
                format_args!("Children (size: {}):", node.children.len()),
            )?;
            for (i, child) in node.children.iter().enumerate().rev() {
                stack.push((child, format!("Child[{i}]:"), depth + 1));
            }
        }

        Ok(())
    }
}

fn floats(values: &[f32]) -> String {
    let values = values
        .iter()
        .map(|v| format!("{v:.6}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{values}]")
}

fn texture(path: &str) -> &str {
    if path.is_empty() { "<none>" } else { path }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodePart;

    fn render(model: &Model) -> String {
        let mut buf = Vec::new();
        write_text(model, &mut buf, "  ").unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_empty_model() {
        let text = render(&Model::default());
        assert!(text.starts_with("Global properties (size: 0):\n\nPoints (size: 0):\n"));
        assert!(text.ends_with("Nodes (size: 0):\n"));
    }

    #[test]
    fn test_sections() {
        let mut root = Node::new("root");
        root.node_parts.push(NodePart::new(0, 0));
        root.children.push(Node::new("child"));

        let model = Model {
            points: vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            parts: vec![vec![0, 1, 2]],
            materials: vec![Material::default()],
            nodes: vec![root],
            global_properties: vec!["static".to_string()],
            ..Model::default()
        };
        let text = render(&model);

        assert!(text.contains("  [0] static\n"));
        assert!(text.contains("  [1.000000, 0.000000, 0.000000]\n"));
        assert!(text.contains("  Part[0] (faces: 1, values: 3):\n    0, 1, 2\n"));
        assert!(text.contains("    Diffuse: [255, 255, 255]\n"));
        assert!(text.contains("    Diffuse texture: <none>\n"));
        assert!(text.contains("  Node[0]:\n    ID: root\n"));
        assert!(text.contains("      part 0 -> material 0\n"));
        assert!(text.contains("    Children (size: 1):\n      Child[0]:\n        ID: child\n"));
    }
}
