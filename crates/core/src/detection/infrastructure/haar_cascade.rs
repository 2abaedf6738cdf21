//! Haar cascade model and its OpenCV XML loader.
//!
//! Two layouts are understood: the legacy `opencv-haar-classifier` storage,
//! where every tree node embeds its feature, and the `opencv-cascade-classifier`
//! storage written by `opencv_traincascade`, where nodes index a shared
//! feature list.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use roxmltree::{Document, Node};
use thiserror::Error;

const LEGACY_TYPE_ID: &str = "opencv-haar-classifier";
const CASCADE_TYPE_ID: &str = "opencv-cascade-classifier";

/// OpenCV never writes more than three rectangles per Haar feature.
const MAX_FEATURE_RECTS: usize = 3;

#[derive(Error, Debug)]
pub enum CascadeError {
    #[error("failed to read cascade {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid cascade XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("malformed cascade: {0}")]
    Malformed(String),
    #[error("unsupported cascade: {0}")]
    Unsupported(String),
}

/// One weighted rectangle of a Haar feature, in window coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub weight: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HaarFeature {
    pub rects: Vec<WeightedRect>,
    /// Rectangles are rotated by 45 degrees.
    pub tilted: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeChild {
    Node(usize),
    Leaf(f64),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
    pub feature: usize,
    pub threshold: f64,
    pub left: NodeChild,
    pub right: NodeChild,
}

/// Weak classifier; evaluation starts at node 0.
pub type Tree = Vec<TreeNode>;

#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    pub trees: Vec<Tree>,
    pub threshold: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct HaarCascade {
    pub window_width: u32,
    pub window_height: u32,
    pub features: Vec<HaarFeature>,
    pub stages: Vec<Stage>,
}

impl HaarCascade {
    pub fn load(path: &Path) -> Result<Self, CascadeError> {
        let xml = fs::read_to_string(path).map_err(|e| CascadeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&xml)
    }

    pub fn parse(xml: &str) -> Result<Self, CascadeError> {
        let doc = Document::parse(xml)?;
        let storage = doc.root_element();
        let root = elements(storage)
            .next()
            .ok_or_else(|| malformed("no cascade element in storage"))?;

        let cascade = match root.attribute("type_id") {
            Some(LEGACY_TYPE_ID) => parse_legacy(root)?,
            Some(CASCADE_TYPE_ID) => parse_trained(root)?,
            Some(other) => {
                return Err(CascadeError::Unsupported(format!("type_id '{other}'")));
            }
            None if find_child(root, "stageType").is_some() => parse_trained(root)?,
            None => parse_legacy(root)?,
        };
        cascade.validate()?;
        Ok(cascade)
    }

    pub fn has_tilted_features(&self) -> bool {
        self.features.iter().any(|f| f.tilted)
    }

    fn validate(&self) -> Result<(), CascadeError> {
        if self.window_width == 0 || self.window_height == 0 {
            return Err(malformed("window size must be positive"));
        }
        if self.stages.is_empty() {
            return Err(malformed("cascade has no stages"));
        }
        let (win_w, win_h) = (self.window_width as i32, self.window_height as i32);
        for feature in &self.features {
            if feature.rects.is_empty() || feature.rects.len() > MAX_FEATURE_RECTS {
                return Err(malformed(format!(
                    "feature has {} rectangles",
                    feature.rects.len()
                )));
            }
            let outside = |r: &WeightedRect| {
                r.x < 0 || r.y < 0 || r.width <= 0 || r.height <= 0
                    || r.x + r.width > win_w || r.y + r.height > win_h
            };
            if !feature.tilted && feature.rects.iter().any(outside) {
                return Err(malformed("feature rectangle outside the window"));
            }
        }
        for (si, stage) in self.stages.iter().enumerate() {
            if stage.trees.is_empty() {
                return Err(malformed(format!("stage {si} has no trees")));
            }
            for tree in &stage.trees {
                self.validate_tree(si, tree)?;
            }
        }
        Ok(())
    }

    // Children must point forward so evaluation always terminates.
    fn validate_tree(&self, stage: usize, tree: &Tree) -> Result<(), CascadeError> {
        if tree.is_empty() {
            return Err(malformed(format!("stage {stage} has an empty tree")));
        }
        for (ni, node) in tree.iter().enumerate() {
            if node.feature >= self.features.len() {
                return Err(malformed(format!(
                    "stage {stage}: feature index {} out of range",
                    node.feature
                )));
            }
            for child in [node.left, node.right] {
                if let NodeChild::Node(next) = child {
                    if next <= ni || next >= tree.len() {
                        return Err(malformed(format!(
                            "stage {stage}: node {ni} has invalid child {next}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

// --- Legacy layout ---

fn parse_legacy(root: Node) -> Result<HaarCascade, CascadeError> {
    let size: Vec<u32> = parse_list(text_of(root, "size")?, "size")?;
    let [window_width, window_height] = size[..] else {
        return Err(malformed("size must hold two values"));
    };

    let mut features = Vec::new();
    let mut stages = Vec::new();
    for stage_node in elements(child(root, "stages")?) {
        let mut trees = Vec::new();
        for tree_node in elements(child(stage_node, "trees")?) {
            let mut tree = Vec::new();
            for node in elements(tree_node) {
                features.push(parse_feature(child(node, "feature")?)?);
                tree.push(TreeNode {
                    feature: features.len() - 1,
                    threshold: parse_value(text_of(node, "threshold")?, "threshold")?,
                    left: legacy_child(node, "left_val", "left_node")?,
                    right: legacy_child(node, "right_val", "right_node")?,
                });
            }
            trees.push(tree);
        }
        stages.push(Stage {
            trees,
            threshold: parse_value(text_of(stage_node, "stage_threshold")?, "stage_threshold")?,
        });
    }

    Ok(HaarCascade {
        window_width,
        window_height,
        features,
        stages,
    })
}

fn legacy_child(node: Node, leaf_tag: &str, node_tag: &str) -> Result<NodeChild, CascadeError> {
    if let Some(leaf) = find_child(node, leaf_tag) {
        return Ok(NodeChild::Leaf(parse_value(node_text(leaf), leaf_tag)?));
    }
    if let Some(next) = find_child(node, node_tag) {
        return Ok(NodeChild::Node(parse_value(node_text(next), node_tag)?));
    }
    Err(malformed(format!("node has neither {leaf_tag} nor {node_tag}")))
}

// --- traincascade layout ---

fn parse_trained(root: Node) -> Result<HaarCascade, CascadeError> {
    let stage_type = text_of(root, "stageType")?;
    if stage_type != "BOOST" {
        return Err(CascadeError::Unsupported(format!("stage type {stage_type}")));
    }
    let feature_type = text_of(root, "featureType")?;
    if feature_type != "HAAR" {
        return Err(CascadeError::Unsupported(format!("feature type {feature_type}")));
    }

    let window_width = parse_value(text_of(root, "width")?, "width")?;
    let window_height = parse_value(text_of(root, "height")?, "height")?;

    let features = elements(child(root, "features")?)
        .map(parse_feature)
        .collect::<Result<Vec<_>, _>>()?;

    let mut stages = Vec::new();
    for stage_node in elements(child(root, "stages")?) {
        let trees = elements(child(stage_node, "weakClassifiers")?)
            .map(parse_weak_classifier)
            .collect::<Result<Vec<_>, _>>()?;
        stages.push(Stage {
            trees,
            threshold: parse_value(text_of(stage_node, "stageThreshold")?, "stageThreshold")?,
        });
    }

    Ok(HaarCascade {
        window_width,
        window_height,
        features,
        stages,
    })
}

/// `internalNodes` holds `left right feature threshold` per node; a child
/// value above zero indexes another node, otherwise `-value` indexes
/// `leafValues`.
fn parse_weak_classifier(node: Node) -> Result<Tree, CascadeError> {
    let internal: Vec<f64> = parse_list(text_of(node, "internalNodes")?, "internalNodes")?;
    let leaves: Vec<f64> = parse_list(text_of(node, "leafValues")?, "leafValues")?;
    if internal.is_empty() || internal.len() % 4 != 0 {
        return Err(malformed("internalNodes must hold groups of four values"));
    }

    let resolve = |value: f64| -> Result<NodeChild, CascadeError> {
        let index = value as i64;
        if index > 0 {
            Ok(NodeChild::Node(index as usize))
        } else {
            leaves
                .get((-index) as usize)
                .map(|&v| NodeChild::Leaf(v))
                .ok_or_else(|| malformed(format!("leaf index {} out of range", -index)))
        }
    };

    internal
        .chunks_exact(4)
        .map(|n| -> Result<TreeNode, CascadeError> {
            Ok(TreeNode {
                feature: n[2] as usize,
                threshold: n[3],
                left: resolve(n[0])?,
                right: resolve(n[1])?,
            })
        })
        .collect()
}

// --- Shared pieces ---

fn parse_feature(node: Node) -> Result<HaarFeature, CascadeError> {
    let rects = elements(child(node, "rects")?)
        .map(|r| parse_rect(node_text(r)))
        .collect::<Result<Vec<_>, _>>()?;
    let tilted = match find_child(node, "tilted") {
        Some(t) => parse_value::<i32>(node_text(t), "tilted")? != 0,
        None => false,
    };
    Ok(HaarFeature { rects, tilted })
}

/// Parses `"x y w h weight"`; weights are often written as `-1.`.
fn parse_rect(text: &str) -> Result<WeightedRect, CascadeError> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    let [x, y, w, h, weight] = parts[..] else {
        return Err(malformed(format!("rect '{text}' must hold five values")));
    };
    Ok(WeightedRect {
        x: parse_value(x, "rect x")?,
        y: parse_value(y, "rect y")?,
        width: parse_value(w, "rect width")?,
        height: parse_value(h, "rect height")?,
        weight: parse_value(weight, "rect weight")?,
    })
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|n| n.is_element())
}

fn find_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    elements(node).find(|n| n.has_tag_name(name))
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Result<Node<'a, 'input>, CascadeError> {
    find_child(node, name).ok_or_else(|| {
        malformed(format!(
            "<{}> is missing <{name}>",
            node.tag_name().name()
        ))
    })
}

fn node_text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().unwrap_or("").trim()
}

fn text_of<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str, CascadeError> {
    child(node, name).map(node_text)
}

fn parse_value<T: FromStr>(text: &str, what: &str) -> Result<T, CascadeError> {
    text.trim()
        .parse()
        .map_err(|_| malformed(format!("invalid {what}: '{text}'")))
}

fn parse_list<T: FromStr>(text: &str, what: &str) -> Result<Vec<T>, CascadeError> {
    text.split_whitespace()
        .map(|v| parse_value(v, what))
        .collect()
}

fn malformed(message: impl Into<String>) -> CascadeError {
    CascadeError::Malformed(message.into())
}
