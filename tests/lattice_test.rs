mod common;

use coalition_leverage::{
    CharacteristicFunction, Coalition, CoalitionLattice, Dominance, LatticeConfigBuilder,
};
use common::{
    BossGame, CookieGame, GlovesGame, MajorityGame, PipelineGame, ShoesGame, assert_close,
    sub_coalitions,
};

fn assert_complete(lattice: &CoalitionLattice, name: &str) {
    let root = lattice.root();
    let root_coalition = lattice.root_node().coalition;
    let expected: Vec<Coalition> = sub_coalitions(root_coalition).collect();
    assert_eq!(lattice.len(), expected.len(), "{name} node count");
    for coalition in expected {
        assert!(
            lattice.search_down(&coalition, root).is_some(),
            "{name}: {coalition} is missing"
        );
        assert_eq!(
            lattice.find_all_nodes_down(&coalition, root).len(),
            1,
            "{name}: {coalition} is duplicated"
        );
    }
}

#[test]
fn test_every_sub_coalition_is_present_once() {
    assert_complete(&CoalitionLattice::new(&ShoesGame::new(4, 2).unwrap()).unwrap(), "shoes");
    assert_complete(&CoalitionLattice::new(&PipelineGame::new(&[2, 1, 1])).unwrap(), "pipeline");
    assert_complete(&CoalitionLattice::new(&BossGame::new(3)).unwrap(), "boss");
    assert_complete(
        &CoalitionLattice::new(&CookieGame::new(vec![1.0, 4.0, 2.0], 1.3)).unwrap(),
        "cookies",
    );
}

#[test]
fn test_edges_connect_neighbouring_coalitions() {
    let lattice = CoalitionLattice::new(&GlovesGame::new(4, 2).unwrap()).unwrap();
    for (id, node) in lattice.nodes() {
        assert_eq!(node.children.is_empty(), node.coalition.len() == 1);
        for &child in &node.children {
            let child_node = lattice.node(child);
            assert!(child_node.parents.contains(&id));
            assert_eq!(child_node.coalition.len() + 1, node.coalition.len());
            assert!(child_node.coalition.is_subset(&node.coalition));
        }
    }
}

#[test]
fn test_profitable_states_interpolate_from_above() {
    let lattice = CoalitionLattice::new(&MajorityGame::new(3, 2)).unwrap();
    let id = lattice.search(&Coalition::from([1, 2])).unwrap();
    let payoff = &lattice.node(id).payoff;
    assert_eq!(payoff[0], 0.0);
    assert_close(payoff[1], 0.5, "player 1");
    assert_close(payoff[2], 0.5, "player 2");
}

#[test]
fn test_non_profitable_states_can_be_zeroed() {
    let game = BossGame::new(2);
    let pair = Coalition::from([0, 1]);

    let lattice = CoalitionLattice::new(&game).unwrap();
    let id = lattice.search(&pair).unwrap();
    assert_eq!(lattice.node(id).payoff.as_slice(), &[0.5, 0.5, 0.0]);

    let config = LatticeConfigBuilder::default()
        .set_non_profitable_to_zero(true)
        .build()
        .unwrap();
    let zeroed = CoalitionLattice::build(&game, &config).unwrap();
    let id = zeroed.search(&pair).unwrap();
    assert_eq!(zeroed.node(id).payoff.as_slice(), &[0.0, 0.0, 0.0]);
    // The root keeps its Shapley value
    assert_eq!(zeroed.root_node().payoff, lattice.root_node().payoff);
}

#[test]
fn test_upward_growth() {
    let game = BossGame::new(2);
    let config = LatticeConfigBuilder::default()
        .root(Coalition::from([0, 1]))
        .grow_upward(true)
        .build()
        .unwrap();
    let lattice = CoalitionLattice::build(&game, &config).unwrap();

    assert_eq!(lattice.root_node().coalition, Coalition::from([0, 1]));
    assert_eq!(lattice.len(), 4);
    assert_eq!(lattice.to_set_up(lattice.root()).len(), 1);

    let top = lattice.search(&game.grand_coalition()).unwrap();
    let payoff = &lattice.node(top).payoff;
    assert_close(payoff[0], 1.0, "boss");
    assert_close(payoff[1], 0.5, "first worker");
    assert_close(payoff[2], 0.5, "second worker");
    // Only reachable coalitions are grown
    assert!(lattice.search(&Coalition::from([1, 2])).is_none());
}

#[test]
fn test_complete_missing_states() {
    let game = BossGame::new(2);
    let config = LatticeConfigBuilder::default()
        .root(Coalition::from([0, 1]))
        .grow_upward(true)
        .complete_missing_states(true)
        .build()
        .unwrap();
    let lattice = CoalitionLattice::build(&game, &config).unwrap();

    assert_eq!(lattice.root_node().coalition, game.grand_coalition());
    assert_complete(&lattice, "completed boss");

    let id = lattice.search(&Coalition::from([0, 2])).unwrap();
    assert_eq!(lattice.node(id).payoff.as_slice(), &[0.5, 0.0, 0.5]);
}

#[test]
fn test_merge_is_idempotent() {
    let lattice = CoalitionLattice::new(&ShoesGame::new(4, 2).unwrap()).unwrap();
    let mut again = lattice.clone();
    assert_eq!(again.merge_same_coalition(), 0);
    assert_eq!(again, lattice);
}

#[test]
fn test_unmerged_lattice_has_duplicates() {
    let game = PipelineGame::new(&[1, 1, 1]);
    let config = LatticeConfigBuilder::default()
        .merge_same_coalition(false)
        .build()
        .unwrap();
    let mut lattice = CoalitionLattice::build(&game, &config).unwrap();
    let leaf = Coalition::singleton(0);
    assert!(lattice.find_all_nodes(&leaf, lattice.root()).len() > 1);

    let dropped = lattice.merge_same_coalition();
    assert!(dropped > 0);
    assert_eq!(lattice.find_all_nodes(&leaf, lattice.root()).len(), 1);
    assert_complete(&lattice, "merged pipeline");
}

#[test]
fn test_building_twice_gives_equal_lattices() {
    let game = CookieGame::new(vec![2.0, 3.0, 5.0, 1.0], 1.1);
    let first = CoalitionLattice::new(&game).unwrap();
    let second = CoalitionLattice::new(&game).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
}

#[test]
fn test_dominant_sets_hold_no_overlapping_dominance() {
    let lattice = CoalitionLattice::new(&ShoesGame::new(4, 2).unwrap()).unwrap();
    for relation in [Dominance::Strict, Dominance::Loose, Dominance::BetterOrEqual] {
        let set = lattice.dominant_set(relation);
        assert!(set.is_subset(lattice.to_set()));
        for &i in &set {
            for &j in &set {
                let (a, b) = (lattice.node(i), lattice.node(j));
                if i != j && a.coalition.intersects(&b.coalition) {
                    assert!(!relation.holds(a, b), "{relation:?}: {a} over {b}");
                }
            }
        }
    }
}

#[test]
fn test_all_dominant_matches_relation() {
    let lattice = CoalitionLattice::new(&BossGame::new(2)).unwrap();
    for (id, node) in lattice.nodes() {
        for other in lattice.all_loosely_dominant(id) {
            assert!(lattice.node(other).loosely_dominates(node));
        }
        assert!(lattice.all_better_or_equal(id).contains(&id));
        assert!(!lattice.all_strictly_dominant(id).contains(&id));
    }
}
