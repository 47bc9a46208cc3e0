//! End-to-end aid flows against the simulated contract.

use ccon_core::{ContentAddress, Wei};
use ccon_gateway::{
    CallOptions, ContractGateway, GatewayError, NewGoodsRequest, ProductType, RequestLocation,
    SimulatedContract,
};

fn location() -> RequestLocation {
    RequestLocation {
        street: "200 E Van Buren St".into(),
        city: "Phoenix".into(),
        state: "AZ".into(),
        zip: "85004".into(),
    }
}

#[tokio::test]
async fn goods_request_to_paid_invoice() {
    let sim = SimulatedContract::new();
    let accounts = sim.accounts().await.unwrap();
    let (donor, nonprofit, supplier, beneficiary) = (
        accounts[0].clone(),
        accounts[3].clone(),
        accounts[4].clone(),
        accounts[5].clone(),
    );
    let funds = Wei::from_ether(5);
    sim.deposit(funds, &CallOptions::sender(donor).with_value(funds))
        .await
        .unwrap();

    let request = NewGoodsRequest::new(beneficiary.clone(), "Rice", ProductType::Food, 4, &location());
    sim.register_request(&request, &CallOptions::sender(beneficiary.clone()))
        .await
        .unwrap();
    let open = sim.view_request().await.unwrap().unwrap();
    assert_eq!(open.location, "200 E Van Buren St Phoenix AZ 85004");
    assert_eq!(open.status, "Open");

    let price = Wei::from_ether(1);
    sim.fill_request(
        &supplier,
        price,
        42,
        &CallOptions::sender(supplier.clone()).signed_by("supplier"),
    )
    .await
    .unwrap();
    let offer = sim.view_fill_offer().await.unwrap().unwrap();
    assert_eq!(offer.invoice_number, 42);
    assert_eq!(offer.quantity, 4);

    sim.approve_fill_offer(&CallOptions::sender(nonprofit.clone()))
        .await
        .unwrap();
    let invoice = sim.view_approved_invoice().await.unwrap().unwrap();
    assert_eq!(invoice.amount, price);

    let supplier_before = sim.balance(&supplier).await.unwrap();
    sim.pay_invoice(42, true, &CallOptions::sender(nonprofit))
        .await
        .unwrap();
    assert_eq!(
        sim.balance(&supplier).await.unwrap(),
        supplier_before.checked_add(price).unwrap()
    );
    assert_eq!(
        sim.balance(&sim.contract_address()).await.unwrap(),
        Wei::from_ether(4)
    );
    assert!(sim.view_approved_invoice().await.unwrap().is_none());
    assert_eq!(sim.view_request().await.unwrap().unwrap().status, "Paid");
}

#[tokio::test]
async fn fill_request_requires_keystore_signature() {
    let sim = SimulatedContract::new();
    let accounts = sim.accounts().await.unwrap();
    let request = NewGoodsRequest::new(accounts[6].clone(), "Ride", ProductType::Ride, 3, &location());
    sim.register_request(&request, &CallOptions::sender(accounts[6].clone()))
        .await
        .unwrap();

    let err = sim
        .fill_request(&accounts[4], Wei(1), 1, &CallOptions::sender(accounts[4].clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::CallFailed { ref function, .. } if function == "fillRequest"));
}

#[tokio::test]
async fn cash_request_and_send() {
    let sim = SimulatedContract::new();
    let accounts = sim.accounts().await.unwrap();
    let funds = Wei::from_ether(3);
    sim.deposit(funds, &CallOptions::sender(accounts[0].clone()).with_value(funds))
        .await
        .unwrap();

    let requester = accounts[7].clone();
    sim.request_cash(Wei::from_ether(1), &CallOptions::sender(requester.clone()))
        .await
        .unwrap();
    let cash = sim.view_cash_request().await.unwrap().unwrap();
    assert_eq!(cash.requester, requester);

    let nonprofit = accounts[3].clone();
    sim.send_cash(cash.amount, &cash.requester, &nonprofit, &CallOptions::sender(nonprofit.clone()))
        .await
        .unwrap();
    assert!(sim.view_cash_request().await.unwrap().is_none());
    assert_eq!(
        sim.balance(&requester).await.unwrap(),
        Wei::from_ether(101)
    );
}

#[tokio::test]
async fn send_cash_beyond_contract_balance_reverts() {
    let sim = SimulatedContract::new();
    let accounts = sim.accounts().await.unwrap();
    sim.request_cash(Wei::from_ether(1), &CallOptions::sender(accounts[5].clone()))
        .await
        .unwrap();
    let err = sim
        .send_cash(
            Wei::from_ether(1),
            &accounts[5],
            &accounts[3],
            &CallOptions::sender(accounts[3].clone()),
        )
        .await
        .unwrap_err();
    assert!(err.is_call_failure());
}

#[tokio::test]
async fn pointer_starts_unset_and_is_overwritten() {
    let sim = SimulatedContract::new();
    assert!(sim.ipfs_hash().await.unwrap().is_none());
    let owner = CallOptions::sender(sim.accounts().await.unwrap()[3].clone());
    let p1 = ContentAddress::new("QmFirst").unwrap();
    let p2 = ContentAddress::new("QmSecond").unwrap();
    sim.set_ipfs_hash(&p1, &owner).await.unwrap();
    sim.set_ipfs_hash(&p2, &owner).await.unwrap();
    assert_eq!(sim.ipfs_hash().await.unwrap(), Some(p2));
    assert_eq!(sim.pointer_writes(), 2);
}
