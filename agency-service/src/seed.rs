use anyhow::Result;
use bigdecimal::BigDecimal;
use shared::*;
use tracing::info;

const DEMO_PASSWORD: &str = "123456";

const DEMO_AGENTS: [(&str, &str, &str); 3] = [
    ("John", "Doe", "agent1@car.com"),
    ("Jane", "Doe", "agent2@car.com"),
    ("Jean", "Doe", "agent3@car.com"),
];

const DEMO_CUSTOMERS: [(&str, &str, &str); 3] = [
    ("John", "Doe", "john@test.com"),
    ("Jane", "Doe", "jane@test.com"),
    ("Jean", "Doe", "jean@test.com"),
];

const DEMO_CARS: [(&str, &str, i32, i64); 10] = [
    ("Audi", "A3", 5, 80),
    ("Bmw", "M4", 5, 120),
    ("Kia", "Picanto", 4, 30),
    ("Renault", "Master", 2, 60),
    ("Peugeot", "Kangoo", 3, 45),
    ("Renault", "Espace", 8, 80),
    ("Renault", "Scenic", 7, 75),
    ("Peugeot", "306", 5, 40),
    ("Audi", "A1", 5, 50),
    ("Audi", "A7", 5, 140),
];

/// Inserts the demo agents, customers and cars. Agents and customers whose
/// email already exists are skipped; cars are only added to an empty catalog.
pub async fn seed_demo_data(
    agents: &dyn AgentRepository,
    customers: &dyn CustomerRepository,
    cars: &dyn CarRepository,
    verifier: &dyn PasswordVerifier,
) -> Result<()> {
    let mut added_agents = 0;
    for (name, surname, email) in DEMO_AGENTS {
        if agents.find_by_email(email).await?.is_some() {
            continue;
        }
        agents
            .insert(NewAgent {
                name: name.to_string(),
                surname: surname.to_string(),
                email: email.to_string(),
                password_hash: verifier.hash(DEMO_PASSWORD)?,
            })
            .await?;
        added_agents += 1;
    }

    let mut added_customers = 0;
    for (name, surname, email) in DEMO_CUSTOMERS {
        if !customers.find_by_email(email).await?.is_empty() {
            continue;
        }
        customers
            .insert(NewCustomer {
                name: name.to_string(),
                surname: surname.to_string(),
                email: email.to_string(),
                address: "6 avenue de la république".to_string(),
                city: "villejuif".to_string(),
                zip_code: "94200".to_string(),
                country: "France".to_string(),
            })
            .await?;
        added_customers += 1;
    }

    let mut added_cars = 0;
    if cars.list().await?.is_empty() {
        for (brand, model, seats, price) in DEMO_CARS {
            cars.insert(NewCar {
                brand: brand.to_string(),
                model: model.to_string(),
                seats,
                price_per_day: BigDecimal::from(price),
                available: true,
            })
            .await?;
            added_cars += 1;
        }
    }

    info!(
        agents = added_agents,
        customers = added_customers,
        cars = added_cars,
        "demo data seeded"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn seeding_twice_adds_nothing_the_second_time() {
        let store = InMemoryStore::new();
        let verifier = BcryptVerifier::new(4);

        seed_demo_data(&store, &store, &store, &verifier).await.unwrap();
        seed_demo_data(&store, &store, &store, &verifier).await.unwrap();

        assert_eq!(CarRepository::list(&store).await.unwrap().len(), 10);
        assert_eq!(
            CustomerRepository::find_by_email(&store, "john@test.com")
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn seeded_agent_can_use_the_desk() {
        let store = Arc::new(InMemoryStore::new());
        let verifier = Arc::new(BcryptVerifier::new(4));
        seed_demo_data(store.as_ref(), store.as_ref(), store.as_ref(), verifier.as_ref())
            .await
            .unwrap();

        let desk = RentalDesk::with_store(store, verifier);
        let catalog = desk
            .list_catalog(&Credentials::new("agent2@car.com", DEMO_PASSWORD))
            .await
            .unwrap();
        assert!(catalog.iter().any(|car| car.brand == "Kia" && car.seats == 4));
    }
}
