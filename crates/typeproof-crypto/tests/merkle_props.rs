//! Property tests for the incremental Merkle tree.

use std::sync::Arc;

use proptest::prelude::*;
use typeproof_core::FieldElement;
use typeproof_crypto::{FieldHasher, IncrementalMerkleTree, Sha256FieldHasher};

fn hasher() -> Arc<dyn FieldHasher> {
    Arc::new(Sha256FieldHasher)
}

fn leaves(max: usize) -> impl Strategy<Value = Vec<FieldElement>> {
    prop::collection::vec(any::<u64>().prop_map(FieldElement::from_u64), 0..max)
}

proptest! {
    #[test]
    fn same_insertion_order_same_root(depth in 1u32..=6, values in leaves(64)) {
        let capacity = 1usize << depth;
        let values: Vec<_> = values.into_iter().take(capacity).collect();
        let mut a = IncrementalMerkleTree::new(depth, hasher()).unwrap();
        let mut b = IncrementalMerkleTree::new(depth, hasher()).unwrap();
        for v in &values {
            a.add_leaf(*v).unwrap();
            b.add_leaf(*v).unwrap();
        }
        prop_assert_eq!(a.root(), b.root());
        let rebuilt = IncrementalMerkleTree::from_leaves(depth, hasher(), &values).unwrap();
        prop_assert_eq!(a.root(), rebuilt.root());
    }

    #[test]
    fn every_proof_folds_to_root(depth in 1u32..=6, values in leaves(64)) {
        let capacity = 1usize << depth;
        let values: Vec<_> = values.into_iter().take(capacity).collect();
        let tree = IncrementalMerkleTree::from_leaves(depth, hasher(), &values).unwrap();
        let root = tree.root();
        for index in 0..values.len() as u64 {
            let proof = tree.proof(index).unwrap();
            prop_assert_eq!(proof.path.len(), depth as usize);
            for (level, step) in proof.path.iter().enumerate() {
                prop_assert_eq!(step.is_right, (index >> level) & 1 == 1);
            }
            prop_assert!(proof.verify(&root, &Sha256FieldHasher));
        }
        prop_assert!(tree.proof(values.len() as u64).is_err());
    }

    #[test]
    fn tampered_leaf_does_not_verify(values in leaves(16), pick in any::<prop::sample::Index>()) {
        prop_assume!(!values.is_empty());
        let tree = IncrementalMerkleTree::from_leaves(4, hasher(), &values).unwrap();
        let index = pick.index(values.len()) as u64;
        let mut proof = tree.proof(index).unwrap();
        proof.leaf = Sha256FieldHasher.hash(&[proof.leaf]);
        prop_assert!(!proof.verify(&tree.root(), &Sha256FieldHasher));
    }
}

#[test]
fn empty_tree_root_equals_zero_at_depth() {
    for depth in 1..=8 {
        let tree = IncrementalMerkleTree::new(depth, hasher()).unwrap();
        assert_eq!(Some(tree.root()), tree.zero(depth));
    }
}
