use crate::{axis::Axis, errors::EdsError};
use std::collections::VecDeque;

/// Commitment scheme binding an ordered sequence of chunks to a single root.
///
/// Roots are opaque to the rest of the crate and only ever compared for byte equality, so any
/// deterministic scheme where a single differing chunk changes the root will do.
pub trait Tree {
    /// Appends the next leaf.
    fn push(&mut self, data: &[u8]);

    /// Computes the root over all leaves pushed so far.
    fn root(&mut self) -> Result<Vec<u8>, EdsError>;
}

/// Builds a fresh, empty commitment tree for vector `index` along `axis`.
pub type TreeConstructorFn = fn(Axis, usize) -> Box<dyn Tree>;

/// Commits to `chunks` using a tree freshly built by `tree_fn` for vector `index` along `axis`.
pub fn vector_root<T: AsRef<[u8]>>(tree_fn: TreeConstructorFn, axis: Axis, index: usize, chunks: &[T]) -> Result<Vec<u8>, EdsError> {
    let mut tree = tree_fn(axis, index);
    chunks.iter().for_each(|chunk| tree.push(chunk.as_ref()));
    tree.root()
}

/// Default commitment tree: a binary BLAKE3 Merkle tree whose leaves are BLAKE3 digests of the chunks.
#[derive(Clone, Debug, Default)]
pub struct DefaultTree {
    leaves: Vec<blake3::Hash>,
}

impl DefaultTree {
    pub fn new() -> Self {
        DefaultTree { leaves: Vec::new() }
    }
}

impl Tree for DefaultTree {
    fn push(&mut self, data: &[u8]) {
        self.leaves.push(blake3::hash(data));
    }

    fn root(&mut self) -> Result<Vec<u8>, EdsError> {
        let merkle_tree = MerkleTree::new(self.leaves.clone())?;
        Ok(merkle_tree.get_root_commitment().as_bytes().to_vec())
    }
}

/// `TreeConstructorFn` building a [`DefaultTree`] for every row and column.
pub fn new_default_tree(_axis: Axis, _index: usize) -> Box<dyn Tree> {
    Box::new(DefaultTree::new())
}

/// Represents a Merkle Tree, providing functionality to build a binary tree from digests of the leaf nodes
/// and get the root commitment.
pub struct MerkleTree {
    root: blake3::Hash,
}

impl MerkleTree {
    /// Creates a new Merkle Tree from a vector of BLAKE3 hashes representing the leaf nodes.
    ///
    /// A level with an odd number of nodes pairs its last node with the zero hash of that level.
    ///
    /// # Arguments
    ///
    /// * `leaf_nodes` - A `Vec<blake3::Hash>` where each hash is a leaf node of the tree.
    ///
    /// # Returns
    ///
    /// * `Result<Self, EdsError>` - Returns a `MerkleTree` instance if successful,
    ///   or a `EdsError::NoLeafNodesToBuildMerkleTreeOn` if `leaf_nodes` is empty.
    pub fn new(leaf_nodes: Vec<blake3::Hash>) -> Result<Self, EdsError> {
        let mut zero_hash = blake3::Hash::from_bytes([0u8; 32]);
        let mut current_level = VecDeque::from(leaf_nodes);

        while current_level.len() > 1 {
            let mut parent_level = VecDeque::with_capacity(current_level.len().div_ceil(2));

            while let Some(left) = current_level.pop_front() {
                let right = current_level.pop_front().unwrap_or(zero_hash);
                parent_level.push_back(Self::parent_hash(left.as_bytes(), right.as_bytes()));
            }

            zero_hash = Self::parent_hash(zero_hash.as_bytes(), zero_hash.as_bytes());
            current_level = parent_level;
        }

        current_level
            .pop_front()
            .map(|root| MerkleTree { root })
            .ok_or(EdsError::NoLeafNodesToBuildMerkleTreeOn)
    }

    /// Returns the root commitment (hash) of the Merkle Tree.
    pub fn get_root_commitment(&self) -> blake3::Hash {
        self.root
    }

    fn parent_hash(left: &[u8], right: &[u8]) -> blake3::Hash {
        blake3::Hasher::new().update(left).update(right).finalize()
    }
}

#[cfg(test)]
pub mod tests {
    use super::{DefaultTree, MerkleTree, Tree, new_default_tree, vector_root};
    use crate::{axis::Axis, errors::EdsError};
    use rand::Rng;

    /// Flips bit at index `bit_idx`, returning resulting byte.
    /// Caller must ensure that `bit_idx <= 7`.
    pub fn flip_a_bit(byte: u8, bit_idx: usize) -> u8 {
        byte ^ (1u8 << bit_idx)
    }

    #[test]
    fn test_new_with_empty_leaf_nodes() {
        assert!(matches!(MerkleTree::new(Vec::new()), Err(EdsError::NoLeafNodesToBuildMerkleTreeOn)));
        assert_eq!(DefaultTree::new().root(), Err(EdsError::NoLeafNodesToBuildMerkleTreeOn));
    }

    #[test]
    fn test_new_with_single_leaf_node() {
        let leaf_nodes = vec![blake3::hash(b"hello")];
        let merkle_tree = MerkleTree::new(leaf_nodes.clone()).expect("Must be able to build Merkle Tree");
        assert_eq!(merkle_tree.get_root_commitment(), leaf_nodes[0]);
    }

    #[test]
    fn test_new_with_two_leaf_nodes() {
        let leaf1 = blake3::hash(b"hello");
        let leaf2 = blake3::hash(b"world");

        let merkle_tree = MerkleTree::new(vec![leaf1, leaf2]).expect("Must be able to build Merkle Tree");
        let expected_root = MerkleTree::parent_hash(leaf1.as_bytes(), leaf2.as_bytes());

        assert_eq!(merkle_tree.get_root_commitment(), expected_root);
    }

    #[test]
    fn test_new_with_three_leaf_nodes_pads_with_zero_hash() {
        let leaves = [blake3::hash(b"a"), blake3::hash(b"b"), blake3::hash(b"c")];
        let zero_hash = blake3::Hash::from_bytes([0u8; 32]);

        let left = MerkleTree::parent_hash(leaves[0].as_bytes(), leaves[1].as_bytes());
        let right = MerkleTree::parent_hash(leaves[2].as_bytes(), zero_hash.as_bytes());
        let expected_root = MerkleTree::parent_hash(left.as_bytes(), right.as_bytes());

        let merkle_tree = MerkleTree::new(leaves.to_vec()).expect("Must be able to build Merkle Tree");
        assert_eq!(merkle_tree.get_root_commitment(), expected_root);
    }

    #[test]
    fn test_default_tree_commits_to_chunk_digests() {
        let chunks = [vec![1u8; 64], vec![2u8; 64]];

        let mut tree = DefaultTree::new();
        chunks.iter().for_each(|chunk| tree.push(chunk));

        let expected_root = MerkleTree::new(chunks.iter().map(|chunk| blake3::hash(chunk)).collect()).unwrap().get_root_commitment();
        assert_eq!(tree.root().unwrap(), expected_root.as_bytes().to_vec());
        assert_eq!(vector_root(new_default_tree, Axis::Row, 0, &chunks).unwrap(), expected_root.as_bytes().to_vec());
    }

    #[test]
    fn prop_test_any_flipped_bit_changes_root() {
        const NUM_TEST_ITERATIONS: usize = 10;

        let mut rng = rand::rng();

        (0..NUM_TEST_ITERATIONS).for_each(|_| {
            let num_chunks = rng.random_range(1..=64usize);
            let mut chunks = (0..num_chunks).map(|_| (0..32).map(|_| rng.random()).collect::<Vec<u8>>()).collect::<Vec<Vec<u8>>>();

            let root = vector_root(new_default_tree, Axis::Column, 0, &chunks).unwrap();

            let chunk_idx = rng.random_range(0..num_chunks);
            let byte_idx = rng.random_range(0..32);
            let bit_idx = rng.random_range(0..u8::BITS) as usize;
            chunks[chunk_idx][byte_idx] = flip_a_bit(chunks[chunk_idx][byte_idx], bit_idx);

            assert_ne!(vector_root(new_default_tree, Axis::Column, 0, &chunks).unwrap(), root);
        });
    }
}
