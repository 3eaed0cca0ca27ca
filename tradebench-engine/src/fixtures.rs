//! Pre-seeded test users
//!
//! Accounts baked into the target's initial dataset, with a known cost
//! (how much load driving them is worth) and a known order count. The
//! recipe selector consumes this roster for the scripted and brute-force
//! scenario variants, so correctness probes can rely on predictable
//! history.

/// One pre-seeded account in the target's initial dataset
#[derive(Debug, Clone)]
pub struct TestUser {
    pub bank_id: &'static str,
    pub name: &'static str,
    pub password: &'static str,
    pub cost: i64,
    pub orders: i64,
}

const fn user(
    bank_id: &'static str,
    name: &'static str,
    password: &'static str,
    cost: i64,
    orders: i64,
) -> TestUser {
    TestUser {
        bank_id,
        name,
        password,
        cost,
        orders,
    }
}

/// The full fixture roster; shuffled once per run by the manager
pub fn roster() -> Vec<TestUser> {
    vec![
        user("fx-martin-01", "martin ashby", "c6kxh2rb9wmd", 12, 34),
        user("fx-imogen-02", "imogen sale", "t2rwqpe8nkzu", 11, 30),
        user("fx-ronnie-03", "ronnie calder", "y4mjw7xq2dfe", 10, 27),
        user("fx-blair-04", "blair whitfield", "u9dkr3ty6hwz", 10, 25),
        user("fx-sidney-05", "sidney mortlake", "p5qzv8nw3jkc", 9, 22),
        user("fx-eden-06", "eden bracknell", "m7hfj4ws9qtx", 8, 19),
        user("fx-rowan-07", "rowan tilbury", "k3xnd6pv2mzw", 8, 17),
        user("fx-marley-08", "marley hart", "w8tcq5rj7ynd", 7, 15),
        user("fx-ashton-09", "ashton veryan", "e2bvk9mx4wqh", 7, 13),
        user("fx-skye-10", "skye aldersey", "r6wpn3jd8mzt", 6, 11),
        user("fx-finley-11", "finley drummond", "h9qmv2cx5wkf", 6, 9),
        user("fx-robin-12", "robin marsh", "z4jtw7nb3qdx", 5, 8),
        user("fx-ainsley-13", "ainsley cort", "g8fxp2mh6vwn", 4, 6),
        user("fx-emery-14", "emery blackwood", "b5wnq9kt3jzr", 3, 4),
        user("fx-darcy-15", "darcy linden", "n7vhm4sx8cqw", 2, 3),
        user("fx-shiloh-16", "shiloh penhale", "d3kzr6wf9ptm", 2, 2),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn bank_ids_are_unique() {
        let roster = roster();
        let ids: HashSet<_> = roster.iter().map(|u| u.bank_id).collect();
        assert_eq!(ids.len(), roster.len());
    }

    #[test]
    fn roster_covers_every_cost_tier_the_selector_asks_for() {
        let roster = roster();
        // Brute-force slots want cost >= 10, scripted slots cost >= 6.
        assert!(roster.iter().any(|u| u.cost >= 10));
        assert!(roster.iter().any(|u| (6..10).contains(&u.cost)));
    }
}
