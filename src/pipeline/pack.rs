//! Binary-tree rectangle packing for sprite sheets.
//!
//! Blocks are placed largest side first into a tree of free rectangles. When
//! nothing fits the root grows right or down, whichever keeps the sheet
//! closer to square.

/// Top-left corner assigned to a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
}

/// Packing result; `placements` follows the input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packed {
    pub width: u32,
    pub height: u32,
    pub placements: Vec<Placement>,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    used: bool,
    right: Option<usize>,
    down: Option<usize>,
}

impl Node {
    const fn free(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            used: false,
            right: None,
            down: None,
        }
    }
}

struct Packer {
    nodes: Vec<Node>,
    root: usize,
}

impl Packer {
    fn new(w: u32, h: u32) -> Self {
        Self {
            nodes: vec![Node::free(0, 0, w, h)],
            root: 0,
        }
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn find(&self, idx: usize, w: u32, h: u32) -> Option<usize> {
        let node = self.nodes[idx];
        if node.used {
            node.right
                .and_then(|r| self.find(r, w, h))
                .or_else(|| node.down.and_then(|d| self.find(d, w, h)))
        } else if w <= node.w && h <= node.h {
            Some(idx)
        } else {
            None
        }
    }

    fn split(&mut self, idx: usize, w: u32, h: u32) -> Placement {
        let node = self.nodes[idx];
        let down = self.push(Node::free(node.x, node.y + h, node.w, node.h - h));
        let right = self.push(Node::free(node.x + w, node.y, node.w - w, h));
        let n = &mut self.nodes[idx];
        n.used = true;
        n.down = Some(down);
        n.right = Some(right);
        Placement { x: node.x, y: node.y }
    }

    fn place(&mut self, w: u32, h: u32) -> Placement {
        if let Some(idx) = self.find(self.root, w, h) {
            return self.split(idx, w, h);
        }

        let root = self.nodes[self.root];
        let can_grow_down = w <= root.w;
        let can_grow_right = h <= root.h;
        let should_grow_right = can_grow_right && root.h >= root.w + w;
        let should_grow_down = can_grow_down && root.w >= root.h + h;

        if should_grow_right {
            self.grow_right(w, h)
        } else if should_grow_down {
            self.grow_down(w, h)
        } else if can_grow_right {
            self.grow_right(w, h)
        } else if can_grow_down {
            self.grow_down(w, h)
        } else {
            // Taller and wider than the sheet: only reachable with unsorted
            // input. Grow right to the block's height.
            self.grow_right(w, h)
        }
    }

    fn grow_right(&mut self, w: u32, h: u32) -> Placement {
        let old = self.nodes[self.root];
        let height = old.h.max(h);
        let right = self.push(Node::free(old.w, 0, w, height));
        let old_root = self.root;
        self.root = self.push(Node {
            x: 0,
            y: 0,
            w: old.w + w,
            h: height,
            used: true,
            right: Some(right),
            down: Some(old_root),
        });
        self.split(right, w, h)
    }

    fn grow_down(&mut self, w: u32, h: u32) -> Placement {
        let old = self.nodes[self.root];
        let down = self.push(Node::free(0, old.h, old.w, h));
        let old_root = self.root;
        self.root = self.push(Node {
            x: 0,
            y: 0,
            w: old.w,
            h: old.h + h,
            used: true,
            right: Some(old_root),
            down: Some(down),
        });
        self.split(down, w, h)
    }
}

/// Pack `sizes` (width, height) with `padding` pixels between blocks.
pub fn pack(sizes: &[(u32, u32)], padding: u32) -> Packed {
    if sizes.is_empty() {
        return Packed {
            width: 0,
            height: 0,
            placements: Vec::new(),
        };
    }

    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|&a, &b| {
        let (aw, ah) = sizes[a];
        let (bw, bh) = sizes[b];
        bw.max(bh)
            .cmp(&aw.max(ah))
            .then(bh.cmp(&ah))
            .then(a.cmp(&b))
    });

    let padded = |i: usize| (sizes[i].0 + padding, sizes[i].1 + padding);
    let (w0, h0) = padded(order[0]);
    let mut packer = Packer::new(w0, h0);

    let mut placements = vec![Placement { x: 0, y: 0 }; sizes.len()];
    for &i in &order {
        let (w, h) = padded(i);
        placements[i] = packer.place(w, h);
    }

    let width = placements
        .iter()
        .zip(sizes)
        .map(|(p, (w, _))| p.x + w)
        .max()
        .unwrap_or(0);
    let height = placements
        .iter()
        .zip(sizes)
        .map(|(p, (_, h))| p.y + h)
        .max()
        .unwrap_or(0);

    Packed {
        width,
        height,
        placements,
    }
}
