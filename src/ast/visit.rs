use super::{NodeId, Tree};

/// Depth-first traversal hooks. `pre` runs before a node's children, `post` after.
pub trait Visitor {
    fn pre(&mut self, _tree: &Tree, _id: NodeId) {}
    fn post(&mut self, _tree: &Tree, _id: NodeId) {}
}

struct Callbacks<Pre, Post> {
    pre: Pre,
    post: Post,
}

impl<Pre, Post> Visitor for Callbacks<Pre, Post>
where
    Pre: FnMut(&Tree, NodeId),
    Post: FnMut(&Tree, NodeId),
{
    fn pre(&mut self, tree: &Tree, id: NodeId) {
        (self.pre)(tree, id);
    }

    fn post(&mut self, tree: &Tree, id: NodeId) {
        (self.post)(tree, id);
    }
}

/// Walk `root` with separate pre-order and post-order callbacks.
pub fn visit<Pre, Post>(tree: &Tree, root: NodeId, pre: Pre, post: Post)
where
    Pre: FnMut(&Tree, NodeId),
    Post: FnMut(&Tree, NodeId),
{
    tree.walk(root, &mut Callbacks { pre, post });
}
